//! mfiutil tabular report dialect.
//!
//! One record per line; a line is a record only if it matches the dialect's
//! pattern. Headers and anything else are skipped without error.
//!
//! ```text
//! mfi0 Volumes:
//!   Id     Size    Level   Stripe  State   Cache   Name
//!  mfid0 (  278G) RAID-1      64K OPTIMAL Disabled <system>
//!
//! mfi0 Physical Drives:
//!  0 (  279G) ONLINE <SEAGATE ST9300605SS 0004 serial=6XP4MQNJ> SAS E1:S0
//! ```

use regex::{Captures, Regex};

use crate::dialect::{expand_args, ReportParser};
use crate::error::Result;
use crate::field::{coerce, index_value, FieldKind, FieldValue};
use crate::model::{PhysicalDriveRecord, VirtualDriveRecord, NOT_AVAILABLE};

/// Volume line: id (with numeric index), size, level, stripe, state, cache, optional `<name>`
pub const MFIUTIL_VOLUME_PATTERN: &str = r"^\s*(?P<id>\w*?(?P<index>\d+))\s+\(\s*(?P<size>[^)]*?)\s*\)\s+(?P<level>\S+)\s+(?P<stripe>\S+)\s+(?P<state>[\w ]+?)\s+(?P<cache>Disabled|Enabled)(?:\s+<(?P<name>[^>]*)>)?\s*$";

/// Drive line: device id, size, state, `<brand model [revision] serial=...>`, bus type, optional location
///
/// Serials keep any character but whitespace and `>` (`WD-WMC1T2345678`).
pub const MFIUTIL_DRIVE_PATTERN: &str = r"^\s*(?P<device>\d+)\s+\(\s*(?P<size>[^)]*?)\s*\)\s+(?P<state>[\w ]+?)\s+<(?P<brand>\S+)\s+(?P<model>.+?)(?:\s+(?P<revision>\S+))?\s+serial=(?P<serial>[^>\s]+)>\s+(?P<bus>\w+)(?:\s+(?P<location>\S+))?\s*$";

/// Patterns and queries of a tabular report
#[derive(Debug, Clone)]
pub struct TabularDialect {
    pub volume_pattern: Regex,
    pub drive_pattern: Regex,
    pub volume_args: String,
    pub drive_args: String,
    pub log_args: String,
}

impl TabularDialect {
    /// Build a dialect from pattern sources.
    ///
    /// The volume pattern must define the groups `index`, `size`, `level`,
    /// `state` and `name`; the drive pattern `device`, `size`, `state`,
    /// `brand`, `model`, `serial` and `bus`. Missing groups read as empty.
    pub fn new(volume_pattern: &str, drive_pattern: &str) -> Result<Self> {
        Ok(Self {
            volume_pattern: Regex::new(volume_pattern)?,
            drive_pattern: Regex::new(drive_pattern)?,
            volume_args: "-u {adapter} show volumes".into(),
            drive_args: "-u {adapter} show drives".into(),
            log_args: "-u {adapter} show events -c debug".into(),
        })
    }

    /// Stock mfiutil patterns and queries.
    pub fn mfiutil() -> Result<Self> {
        Self::new(MFIUTIL_VOLUME_PATTERN, MFIUTIL_DRIVE_PATTERN)
    }

    fn volume(&self, caps: &Captures<'_>) -> Result<VirtualDriveRecord> {
        let index = index_value(group(caps, "index"))?;
        let name = match group(caps, "name").trim() {
            "" => index.to_string(),
            name => name.to_string(),
        };

        Ok(VirtualDriveRecord {
            index,
            name,
            size: text(group(caps, "size"))?,
            state: text(group(caps, "state"))?.to_lowercase(),
            number_of_drives: 0,
            encryption_type: NOT_AVAILABLE.to_string(),
            raid_level: text(group(caps, "level"))?,
        })
    }

    fn drive(&self, caps: &Captures<'_>) -> Result<PhysicalDriveRecord> {
        let device_id = index_value(group(caps, "device"))?;

        Ok(PhysicalDriveRecord {
            device_id,
            slot_number: device_id,
            raw_size: text(group(caps, "size"))?,
            firmware_state: text(group(caps, "state"))?,
            brand: text(group(caps, "brand"))?,
            model: text(group(caps, "model"))?,
            serial_number: text(group(caps, "serial"))?,
            pd_type: text(group(caps, "bus"))?,
            drive_temperature: NOT_AVAILABLE.to_string(),
            ..Default::default()
        })
    }
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map(|m| m.as_str()).unwrap_or("")
}

/// A matched line whose values do not convert is skipped like a non-matching one.
fn skip_unreadable<T>(line: &str, record: Result<T>) -> Option<T> {
    match record {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("skipping unreadable report line {:?}: {}", line, e);
            None
        }
    }
}

fn text(value: &str) -> Result<String> {
    coerce(value, FieldKind::Text).map(FieldValue::into_text)
}

impl ReportParser for TabularDialect {
    fn volume_args(&self, adapter: u32) -> String {
        expand_args(&self.volume_args, adapter)
    }

    fn drive_args(&self, adapter: u32) -> String {
        expand_args(&self.drive_args, adapter)
    }

    fn log_args(&self, adapter: u32) -> String {
        expand_args(&self.log_args, adapter)
    }

    fn parse_virtual_drives(&self, report: &str) -> Result<Vec<VirtualDriveRecord>> {
        Ok(report
            .lines()
            .filter_map(|line| {
                let caps = self.volume_pattern.captures(line)?;
                skip_unreadable(line, self.volume(&caps))
            })
            .collect())
    }

    fn parse_physical_drives(&self, report: &str) -> Result<Vec<PhysicalDriveRecord>> {
        Ok(report
            .lines()
            .filter_map(|line| {
                let caps = self.drive_pattern.captures(line)?;
                skip_unreadable(line, self.drive(&caps))
            })
            .collect())
    }
}
