//! MegaCli key/value report dialect.
//!
//! A report is a sequence of blocks, one per record, each a run of
//! `Key: Value` lines. Records start at a marker key (`Virtual Drive:` or
//! `Enclosure Device ID:`) and must also carry a co-occurring key
//! (`Target Id` / `Slot Number`); fragments without it are preamble and are
//! dropped. The report ends with an `Exit Code: 0xNN` trailer.
//!
//! ```text
//! Virtual Drive: 0 (Target Id: 0)
//! Name                :
//! Size                : 278.875 GB
//! State               : Optimal
//! Number Of Drives    : 2
//! Encryption Type     : None
//!
//! Exit Code: 0x00
//! ```

use crate::dialect::{expand_args, LinePolicy, ReportParser};
use crate::error::{RaidError, Result};
use crate::field::{index_field, text_field, unsigned_field};
use crate::model::{PhysicalDriveRecord, VirtualDriveRecord};

/// Virtual drive attribute a key maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeField {
    Name,
    Size,
    State,
    NumberOfDrives,
    EncryptionType,
}

/// Physical drive attribute a key maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveField {
    EnclosureDeviceId,
    DeviceId,
    SlotNumber,
    MediaErrorCount,
    OtherErrorCount,
    PredictiveFailureCount,
    PdType,
    RawSize,
    FirmwareState,
    InquiryData,
    DriveTemperature,
}

/// Markers, keys and queries of a key/value report.
///
/// Key tables are ordered; the first key that prefixes a line wins.
#[derive(Debug, Clone)]
pub struct KeyValueDialect {
    /// Separates the report body from the result code
    pub exit_marker: String,
    /// Result code of a successful command
    pub success_code: String,
    pub volume_marker: String,
    pub volume_id_marker: String,
    pub volume_keys: Vec<(String, VolumeField)>,
    pub drive_marker: String,
    pub drive_slot_marker: String,
    pub drive_keys: Vec<(String, DriveField)>,
    pub volume_args: String,
    pub drive_args: String,
    pub log_args: String,
    pub policy: LinePolicy,
}

impl KeyValueDialect {
    /// Stock MegaCli markers and queries.
    pub fn megacli(policy: LinePolicy) -> Self {
        let volume_keys = [
            ("Name", VolumeField::Name),
            ("Size", VolumeField::Size),
            ("State", VolumeField::State),
            ("Number Of Drives", VolumeField::NumberOfDrives),
            ("Encryption Type", VolumeField::EncryptionType),
        ];
        let drive_keys = [
            ("Enclosure Device ID", DriveField::EnclosureDeviceId),
            ("Device Id", DriveField::DeviceId),
            ("Slot Number", DriveField::SlotNumber),
            ("Media Error Count", DriveField::MediaErrorCount),
            ("Other Error Count", DriveField::OtherErrorCount),
            ("Predictive Failure Count", DriveField::PredictiveFailureCount),
            ("PD Type", DriveField::PdType),
            ("Raw Size", DriveField::RawSize),
            ("Firmware state", DriveField::FirmwareState),
            ("Inquiry Data", DriveField::InquiryData),
            ("Drive Temperature", DriveField::DriveTemperature),
        ];

        Self {
            exit_marker: "Exit Code:".into(),
            success_code: "0x00".into(),
            volume_marker: "Virtual Drive:".into(),
            volume_id_marker: "Target Id".into(),
            volume_keys: volume_keys
                .into_iter()
                .map(|(k, f)| (k.to_string(), f))
                .collect(),
            drive_marker: "Enclosure Device ID:".into(),
            drive_slot_marker: "Slot Number".into(),
            drive_keys: drive_keys
                .into_iter()
                .map(|(k, f)| (k.to_string(), f))
                .collect(),
            volume_args: "-ldinfo -lall -a{adapter}".into(),
            drive_args: "-pdlist -a{adapter}".into(),
            log_args: "-fwtermlog -dsply -a{adapter}".into(),
            policy,
        }
    }

    /// Record blocks of `report`, each starting with `marker` and containing `required`.
    fn blocks(&self, report: &str, marker: &str, required: &str) -> Vec<String> {
        report
            .split(marker)
            .filter(|fragment| fragment.contains(required))
            .map(|fragment| format!("{}{}", marker, fragment))
            .collect()
    }

    /// Apply the line policy to the outcome of one line.
    fn settle(&self, line: &str, outcome: Result<()>) -> Result<()> {
        match outcome {
            Err(e) if self.policy == LinePolicy::Lenient && e.is_line_error() => {
                log::warn!("skipping unparsable report line {:?}: {}", line, e);
                Ok(())
            }
            other => other,
        }
    }

    /// `Virtual Drive: 3 (Target Id: 3)` -> 3
    ///
    /// Falls back to the target id when the number before `(` is missing or
    /// unreadable.
    fn volume_index(&self, header: &str) -> Result<u32> {
        let primary = match header.split_once('(') {
            Some((head, _)) => index_field(head),
            None => Err(RaidError::MalformedLine(header.to_string())),
        };
        primary.or_else(|e| match header.split_once(self.volume_id_marker.as_str()) {
            Some((_, rest)) => index_field(rest.split(')').next().unwrap_or(rest)),
            None => Err(e),
        })
    }

    /// A block whose index cannot be read is dropped under the lenient policy.
    fn parse_volume(&self, block: &str) -> Result<Option<VirtualDriveRecord>> {
        let mut vd = VirtualDriveRecord::default();
        let mut lines = block.lines();

        // The header is consumed here so later lines can never move the index.
        let header = lines.next().unwrap_or_default();
        match self.volume_index(header) {
            Ok(index) => vd.index = index,
            Err(e) => {
                self.settle(header, Err(e))?;
                return Ok(None);
            }
        }

        for line in lines {
            let field = self
                .volume_keys
                .iter()
                .find(|(key, _)| line.starts_with(key.as_str()))
                .map(|(_, field)| *field);
            if let Some(field) = field {
                let outcome = apply_volume_field(&mut vd, field, line);
                self.settle(line, outcome)?;
            }
        }

        Ok(Some(vd))
    }

    fn parse_drive(&self, block: &str) -> Result<PhysicalDriveRecord> {
        let mut pd = PhysicalDriveRecord::default();

        for line in block.lines() {
            let field = self
                .drive_keys
                .iter()
                .find(|(key, _)| line.starts_with(key.as_str()))
                .map(|(_, field)| *field);
            if let Some(field) = field {
                let outcome = apply_drive_field(&mut pd, field, line);
                self.settle(line, outcome)?;
            }
        }

        Ok(pd)
    }
}

fn apply_volume_field(vd: &mut VirtualDriveRecord, field: VolumeField, line: &str) -> Result<()> {
    match field {
        VolumeField::Name => vd.name = text_field(line)?,
        VolumeField::Size => vd.size = text_field(line)?,
        VolumeField::State => vd.state = text_field(line)?,
        VolumeField::NumberOfDrives => vd.number_of_drives = index_field(line)?,
        VolumeField::EncryptionType => vd.encryption_type = text_field(line)?,
    }
    Ok(())
}

fn apply_drive_field(pd: &mut PhysicalDriveRecord, field: DriveField, line: &str) -> Result<()> {
    match field {
        DriveField::EnclosureDeviceId => pd.enclosure_device_id = index_field(line)?,
        DriveField::DeviceId => pd.device_id = index_field(line)?,
        DriveField::SlotNumber => pd.slot_number = index_field(line)?,
        DriveField::MediaErrorCount => pd.media_error_count = unsigned_field(line)?,
        DriveField::OtherErrorCount => pd.other_error_count = unsigned_field(line)?,
        DriveField::PredictiveFailureCount => pd.predictive_failure_count = unsigned_field(line)?,
        DriveField::PdType => pd.pd_type = text_field(line)?,
        DriveField::RawSize => pd.raw_size = text_field(line)?,
        DriveField::FirmwareState => pd.firmware_state = text_field(line)?,
        DriveField::InquiryData => apply_inquiry(pd, &text_field(line)?),
        DriveField::DriveTemperature => pd.drive_temperature = text_field(line)?,
    }
    Ok(())
}

/// Split the free-text inquiry field into brand, model and serial.
///
/// The token count picks the layout. Names containing whitespace are
/// misassigned; the report gives no way to tell them apart.
fn apply_inquiry(pd: &mut PhysicalDriveRecord, inquiry: &str) {
    let tokens: Vec<&str> = inquiry.split_whitespace().collect();
    match tokens.as_slice() {
        [serial] => {
            pd.serial_number = serial.to_string();
        }
        [model, serial] => {
            pd.model = model.to_string();
            pd.serial_number = serial.to_string();
        }
        [brand, model, serial] => {
            pd.brand = brand.to_string();
            pd.model = model.to_string();
            pd.serial_number = serial.to_string();
        }
        [_, brand, serial, model] => {
            pd.brand = brand.to_string();
            pd.serial_number = serial.to_string();
            pd.model = model.to_string();
        }
        _ => {}
    }
}

impl ReportParser for KeyValueDialect {
    fn volume_args(&self, adapter: u32) -> String {
        expand_args(&self.volume_args, adapter)
    }

    fn drive_args(&self, adapter: u32) -> String {
        expand_args(&self.drive_args, adapter)
    }

    fn log_args(&self, adapter: u32) -> String {
        expand_args(&self.log_args, adapter)
    }

    fn validate<'a>(&self, raw: &'a str) -> Result<&'a str> {
        let (body, trailer) = raw.split_once(self.exit_marker.as_str()).ok_or_else(|| {
            RaidError::MalformedOutput(format!("no {:?} marker in output", self.exit_marker))
        })?;

        let code = trailer.trim();
        if code != self.success_code {
            return Err(RaidError::CommandFailed(code.to_string()));
        }
        Ok(body)
    }

    fn parse_virtual_drives(&self, report: &str) -> Result<Vec<VirtualDriveRecord>> {
        if report.trim().is_empty() {
            return Err(RaidError::EmptyReport("virtual drive report".into()));
        }

        self.blocks(report, &self.volume_marker, &self.volume_id_marker)
            .iter()
            .map(|block| self.parse_volume(block))
            .filter_map(Result::transpose)
            .collect()
    }

    fn parse_physical_drives(&self, report: &str) -> Result<Vec<PhysicalDriveRecord>> {
        if report.trim().is_empty() {
            return Err(RaidError::EmptyReport("physical drive report".into()));
        }

        self.blocks(report, &self.drive_marker, &self.drive_slot_marker)
            .iter()
            .map(|block| self.parse_drive(block))
            .collect()
    }
}
