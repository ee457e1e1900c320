//! Status model: virtual drives, physical drives, adapters and the snapshot
//! that owns them.
//!
//! # Examples
//!
//! ```
//! use raidlib::model::{VirtualDriveRecord, PhysicalDriveRecord};
//!
//! let vd = VirtualDriveRecord { state: "Degraded".into(), ..Default::default() };
//! assert!(!vd.is_healthy());
//!
//! let pd = PhysicalDriveRecord { firmware_state: "Online, Spun Up".into(), ..Default::default() };
//! assert!(pd.is_healthy());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Placeholder for values a report does not carry
pub const NOT_AVAILABLE: &str = "N/A";

/// Canonical healthy state of a virtual drive (case-insensitive)
const HEALTHY_VOLUME_STATE: &str = "optimal";

/// Token marking a healthy physical drive firmware state (case-insensitive)
const HEALTHY_DRIVE_TOKEN: &str = "online";

/// One logical volume presented by a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDriveRecord {
    /// Index within the adapter
    #[serde(rename = "virtual_drive")]
    pub index: u32,
    /// Display name (may be empty)
    pub name: String,
    /// Human-readable size, verbatim
    pub size: String,
    /// Controller-reported state
    pub state: String,
    /// Member drive count (0 if unknown)
    pub number_of_drives: u32,
    /// Encryption descriptor
    pub encryption_type: String,
    /// RAID level (tabular reports only)
    pub raid_level: String,
}

impl Default for VirtualDriveRecord {
    fn default() -> Self {
        Self {
            index: 0,
            name: String::new(),
            size: String::new(),
            state: String::new(),
            number_of_drives: 0,
            encryption_type: NOT_AVAILABLE.to_string(),
            raid_level: String::new(),
        }
    }
}

impl VirtualDriveRecord {
    /// A volume is healthy when its state is "optimal", ignoring case.
    pub fn is_healthy(&self) -> bool {
        self.state.eq_ignore_ascii_case(HEALTHY_VOLUME_STATE)
    }
}

/// One physical disk attached to a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalDriveRecord {
    pub enclosure_device_id: u32,
    pub device_id: u32,
    pub slot_number: u32,
    pub media_error_count: u64,
    pub other_error_count: u64,
    pub predictive_failure_count: u64,
    /// Interface bus type (SAS, SATA, ...)
    pub pd_type: String,
    /// Raw size, verbatim with unit/sector annotation
    pub raw_size: String,
    pub firmware_state: String,
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    #[serde(alias = "drive_emperature")]
    pub drive_temperature: String,
}

impl Default for PhysicalDriveRecord {
    fn default() -> Self {
        Self {
            enclosure_device_id: 0,
            device_id: 0,
            slot_number: 0,
            media_error_count: 0,
            other_error_count: 0,
            predictive_failure_count: 0,
            pd_type: String::new(),
            raw_size: String::new(),
            firmware_state: String::new(),
            brand: String::new(),
            model: String::new(),
            serial_number: String::new(),
            drive_temperature: NOT_AVAILABLE.to_string(),
        }
    }
}

impl PhysicalDriveRecord {
    /// A drive is healthy when its firmware state mentions "online", ignoring case.
    pub fn is_healthy(&self) -> bool {
        self.firmware_state
            .to_ascii_lowercase()
            .contains(HEALTHY_DRIVE_TOKEN)
    }
}

/// One controller instance and its records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterRecord {
    /// Caller-assigned zero-based index
    pub adapter_id: u32,
    #[serde(rename = "virtual_drive_stats")]
    pub virtual_drives: Vec<VirtualDriveRecord>,
    #[serde(rename = "physical_drive_stats")]
    pub physical_drives: Vec<PhysicalDriveRecord>,
}

impl AdapterRecord {
    pub fn new(adapter_id: u32) -> Self {
        Self {
            adapter_id,
            ..Default::default()
        }
    }
}

/// Drives failing their healthy-state predicate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenDrives {
    pub volumes: Vec<VirtualDriveRecord>,
    pub drives: Vec<PhysicalDriveRecord>,
}

impl BrokenDrives {
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty() && self.drives.is_empty()
    }
}

/// Root aggregate, rebuilt wholesale on every refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    adapter_count: u32,
    utility_path: PathBuf,
    #[serde(rename = "adapter_stats")]
    pub adapters: Vec<AdapterRecord>,
}

impl StatusSnapshot {
    /// Empty snapshot for the given utility and adapter count.
    pub fn new(utility_path: impl Into<PathBuf>, adapter_count: u32) -> Self {
        Self {
            adapter_count,
            utility_path: utility_path.into(),
            adapters: Vec::new(),
        }
    }

    pub fn adapter_count(&self) -> u32 {
        self.adapter_count
    }

    pub fn utility_path(&self) -> &Path {
        &self.utility_path
    }

    /// All virtual drives across adapters, in adapter order.
    pub fn virtual_drives(&self) -> impl Iterator<Item = &VirtualDriveRecord> {
        self.adapters.iter().flat_map(|a| a.virtual_drives.iter())
    }

    /// All physical drives across adapters, in adapter order.
    pub fn physical_drives(&self) -> impl Iterator<Item = &PhysicalDriveRecord> {
        self.adapters.iter().flat_map(|a| a.physical_drives.iter())
    }

    /// Non-optimal volumes and non-online drives.
    pub fn broken(&self) -> BrokenDrives {
        BrokenDrives {
            volumes: self
                .virtual_drives()
                .filter(|vd| !vd.is_healthy())
                .cloned()
                .collect(),
            drives: self
                .physical_drives()
                .filter(|pd| !pd.is_healthy())
                .cloned()
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

macro_rules! display_as_json {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match serde_json::to_string(self) {
                    Ok(json) => f.write_str(&json),
                    Err(e) => write!(f, "{}", e),
                }
            }
        })*
    };
}

display_as_json!(
    VirtualDriveRecord,
    PhysicalDriveRecord,
    AdapterRecord,
    BrokenDrives,
    StatusSnapshot
);

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(state: &str) -> VirtualDriveRecord {
        VirtualDriveRecord {
            state: state.to_string(),
            ..Default::default()
        }
    }

    fn drive(state: &str) -> PhysicalDriveRecord {
        PhysicalDriveRecord {
            firmware_state: state.to_string(),
            ..Default::default()
        }
    }

    fn sample_snapshot() -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::new("/opt/MegaRAID/MegaCli/MegaCli64", 1);
        snapshot.adapters.push(AdapterRecord {
            adapter_id: 0,
            virtual_drives: vec![
                VirtualDriveRecord {
                    index: 0,
                    name: String::new(),
                    size: "278.875 GB".into(),
                    state: "Optimal".into(),
                    number_of_drives: 2,
                    encryption_type: "None".into(),
                    raid_level: String::new(),
                },
                VirtualDriveRecord {
                    index: 1,
                    name: "data".into(),
                    size: "1.817 TB".into(),
                    state: "Degraded".into(),
                    number_of_drives: 3,
                    encryption_type: "None".into(),
                    raid_level: String::new(),
                },
            ],
            physical_drives: vec![
                PhysicalDriveRecord {
                    enclosure_device_id: 64,
                    device_id: 8,
                    slot_number: 0,
                    media_error_count: 0,
                    other_error_count: 3,
                    predictive_failure_count: 0,
                    pd_type: "SAS".into(),
                    raw_size: "279.396 GB [0x22ecb25c Sectors]".into(),
                    firmware_state: "Online, Spun Up".into(),
                    brand: "SEAGATE".into(),
                    model: "ST9300605SS".into(),
                    serial_number: "00046XP4MQNJ".into(),
                    drive_temperature: "65C (149.00 F)".into(),
                },
                PhysicalDriveRecord {
                    slot_number: 1,
                    device_id: 9,
                    firmware_state: "Offline".into(),
                    media_error_count: u64::MAX,
                    ..Default::default()
                },
            ],
        });
        snapshot
    }

    #[test]
    fn test_volume_health_is_case_insensitive() {
        assert!(volume("OPTIMAL").is_healthy());
        assert!(volume("optimal").is_healthy());
        assert!(volume("Optimal").is_healthy());
        assert!(!volume("Degraded").is_healthy());
        assert!(!volume("Partially Degraded").is_healthy());
        assert!(!volume("").is_healthy());
    }

    #[test]
    fn test_drive_health_is_substring_match() {
        assert!(drive("Online, Spun Up").is_healthy());
        assert!(drive("ONLINE").is_healthy());
        assert!(!drive("Offline").is_healthy());
        assert!(!drive("Failed").is_healthy());
        assert!(!drive("Unconfigured(good), Spun Up").is_healthy());
    }

    #[test]
    fn test_defaults_use_not_available() {
        assert_eq!(VirtualDriveRecord::default().encryption_type, "N/A");
        assert_eq!(PhysicalDriveRecord::default().drive_temperature, "N/A");
    }

    #[test]
    fn test_broken_filters_both_kinds() {
        let broken = sample_snapshot().broken();
        assert_eq!(broken.volumes.len(), 1);
        assert_eq!(broken.volumes[0].name, "data");
        assert_eq!(broken.drives.len(), 1);
        assert_eq!(broken.drives[0].slot_number, 1);
        assert!(!broken.is_empty());
        assert!(StatusSnapshot::new("/x", 0).broken().is_empty());
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let snapshot = sample_snapshot();
        let json = snapshot.to_json().unwrap();
        let decoded = StatusSnapshot::from_json(&json).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.physical_drives().nth(1).unwrap().media_error_count, u64::MAX);
    }

    #[test]
    fn test_json_field_names() {
        let json = sample_snapshot().to_json().unwrap();
        for key in [
            "\"adapter_count\":1",
            "\"adapter_stats\"",
            "\"adapter_id\":0",
            "\"virtual_drive_stats\"",
            "\"physical_drive_stats\"",
            "\"virtual_drive\":1",
            "\"number_of_drives\":2",
            "\"encryption_type\":\"None\"",
            "\"enclosure_device_id\":64",
            "\"pd_type\":\"SAS\"",
            "\"firmware_state\":\"Online, Spun Up\"",
            "\"drive_temperature\":\"65C (149.00 F)\"",
        ] {
            assert!(json.contains(key), "missing {} in {}", key, json);
        }
    }

    #[test]
    fn test_legacy_temperature_key_accepted() {
        let json = r#"{"enclosure_device_id":64,"device_id":8,"slot_number":0,
            "media_error_count":0,"other_error_count":0,"predictive_failure_count":0,
            "pd_type":"SAS","raw_size":"","firmware_state":"Online","brand":"",
            "model":"","serial_number":"","drive_emperature":"40C"}"#;
        let pd: PhysicalDriveRecord = serde_json::from_str(json).unwrap();
        assert_eq!(pd.drive_temperature, "40C");
    }

    #[test]
    fn test_display_is_compact_json() {
        let vd = volume("Optimal");
        assert!(vd.to_string().starts_with('{'));
        assert!(vd.to_string().contains("\"state\":\"Optimal\""));
    }
}
