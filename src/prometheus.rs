//! Prometheus exposition of a status snapshot
//!
//! Renders drives as gauges in the text exposition format with `# HELP` and
//! `# TYPE` annotations. One family per metric name; one sample per drive.
//!
//! # Examples
//!
//! ```
//! use raidlib::model::StatusSnapshot;
//! use raidlib::prometheus::RaidExporter;
//!
//! let snapshot = StatusSnapshot::new("/opt/MegaRAID/MegaCli/MegaCli64", 1);
//! let mut exporter = RaidExporter::new("mega");
//! exporter.collect_snapshot(&snapshot);
//! assert!(exporter.export().contains("mega_broken_virtual_drives 0"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{PhysicalDriveRecord, StatusSnapshot, VirtualDriveRecord};

/// Prometheus metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricType {
    Gauge,
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gauge => write!(f, "gauge"),
        }
    }
}

/// A single sample with its labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

/// A metric name with its metadata and samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub metric_type: MetricType,
    pub samples: Vec<MetricSample>,
}

impl MetricFamily {
    /// Create an empty gauge family
    pub fn gauge(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            metric_type: MetricType::Gauge,
            samples: Vec::new(),
        }
    }

    /// Add a labeled sample to this family
    pub fn add_sample(&mut self, value: f64, labels: BTreeMap<String, String>) {
        self.samples.push(MetricSample { labels, value });
    }

    /// Add an unlabeled sample
    pub fn with_value(mut self, value: f64) -> Self {
        self.add_sample(value, BTreeMap::new());
        self
    }

    /// Format this family in Prometheus exposition format
    pub fn format(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# HELP {} {}\n", self.name, self.help));
        out.push_str(&format!("# TYPE {} {}\n", self.name, self.metric_type));

        for sample in &self.samples {
            if sample.labels.is_empty() {
                out.push_str(&format!("{} {}\n", self.name, format_value(sample.value)));
            } else {
                let labels: Vec<String> = sample
                    .labels
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
                    .collect();
                out.push_str(&format!(
                    "{}{{{}}} {}\n",
                    self.name,
                    labels.join(","),
                    format_value(sample.value)
                ));
            }
        }

        out
    }
}

/// Prometheus exporter for controller status
pub struct RaidExporter {
    prefix: String,
    families: Vec<MetricFamily>,
}

impl RaidExporter {
    /// Create an exporter with the given metric name prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: sanitize_metric_name(prefix),
            families: Vec::new(),
        }
    }

    pub fn add(&mut self, family: MetricFamily) {
        self.families.push(family);
    }

    fn prefixed(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }

    /// Add every drive of `snapshot` and the broken-drive totals.
    pub fn collect_snapshot(&mut self, snapshot: &StatusSnapshot) {
        let mut volumes = MetricFamily::gauge(
            &self.prefixed("virtual_drives"),
            "Virtual drive index, labeled with its state",
        );
        let mut drives = MetricFamily::gauge(
            &self.prefixed("physical_drives"),
            "Physical drive device id, labeled with its state",
        );
        let mut media_errors = MetricFamily::gauge(
            &self.prefixed("physical_drive_media_errors"),
            "Media error count reported for the drive",
        );
        let mut other_errors = MetricFamily::gauge(
            &self.prefixed("physical_drive_other_errors"),
            "Other error count reported for the drive",
        );
        let mut predictive = MetricFamily::gauge(
            &self.prefixed("physical_drive_predictive_failures"),
            "Predictive failure count reported for the drive",
        );

        for adapter in &snapshot.adapters {
            for vd in &adapter.virtual_drives {
                volumes.add_sample(vd.index as f64, volume_labels(adapter.adapter_id, vd));
            }
            for pd in &adapter.physical_drives {
                let labels = drive_labels(adapter.adapter_id, pd);
                media_errors.add_sample(pd.media_error_count as f64, labels.clone());
                other_errors.add_sample(pd.other_error_count as f64, labels.clone());
                predictive.add_sample(pd.predictive_failure_count as f64, labels.clone());
                drives.add_sample(pd.device_id as f64, labels);
            }
        }

        for family in [volumes, drives, media_errors, other_errors, predictive] {
            if !family.samples.is_empty() {
                self.add(family);
            }
        }

        let broken = snapshot.broken();
        let broken_volumes = MetricFamily::gauge(
            &self.prefixed("broken_virtual_drives"),
            "Number of virtual drives not in optimal state",
        )
        .with_value(broken.volumes.len() as f64);
        let broken_drives = MetricFamily::gauge(
            &self.prefixed("broken_physical_drives"),
            "Number of physical drives not online",
        )
        .with_value(broken.drives.len() as f64);
        self.add(broken_volumes);
        self.add(broken_drives);
    }

    /// Export all families in Prometheus text exposition format
    pub fn export(&self) -> String {
        let mut output = String::with_capacity(1024);
        for family in &self.families {
            output.push_str(&family.format());
            output.push('\n');
        }
        output
    }

    /// Export and forget the collected families
    pub fn export_and_clear(&mut self) -> String {
        let output = self.export();
        self.families.clear();
        output
    }
}

fn volume_labels(adapter: u32, vd: &VirtualDriveRecord) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("adapter".to_string(), adapter.to_string()),
        ("number_of_drives".to_string(), vd.number_of_drives.to_string()),
        ("state".to_string(), vd.state.clone()),
        ("size".to_string(), vd.size.clone()),
        ("raid_level".to_string(), vd.raid_level.clone()),
    ])
}

fn drive_labels(adapter: u32, pd: &PhysicalDriveRecord) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("adapter".to_string(), adapter.to_string()),
        ("serial".to_string(), pd.serial_number.clone()),
        ("slot".to_string(), pd.slot_number.to_string()),
        ("brand".to_string(), pd.brand.clone()),
        ("model".to_string(), pd.model.clone()),
        ("size".to_string(), pd.raw_size.clone()),
        ("state".to_string(), pd.firmware_state.clone()),
    ])
}

/// Replace anything outside `[A-Za-z0-9_]` with an underscore
fn sanitize_metric_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Integral values print without a fraction
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let inf = if value.is_sign_positive() { "+Inf" } else { "-Inf" };
        inf.to_string()
    } else if value == value.floor() && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AdapterRecord;

    fn snapshot() -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::new("/usr/sbin/mfiutil", 1);
        snapshot.adapters.push(AdapterRecord {
            adapter_id: 0,
            virtual_drives: vec![VirtualDriveRecord {
                index: 1,
                name: "data".into(),
                size: "1862G".into(),
                state: "degraded".into(),
                raid_level: "RAID-5".into(),
                ..Default::default()
            }],
            physical_drives: vec![PhysicalDriveRecord {
                device_id: 9,
                slot_number: 1,
                media_error_count: 12,
                other_error_count: 3,
                predictive_failure_count: 1,
                raw_size: "279G".into(),
                firmware_state: "Failed".into(),
                brand: "SEAGATE".into(),
                model: "ST9300605SS".into(),
                serial_number: "6XP4MQNJ".into(),
                ..Default::default()
            }],
        });
        snapshot
    }

    #[test]
    fn test_family_format() {
        let mut family = MetricFamily::gauge("mega_physical_drives", "Drives");
        family.add_sample(8.0, BTreeMap::from([("slot".to_string(), "0".to_string())]));
        let output = family.format();
        assert!(output.contains("# HELP mega_physical_drives Drives"));
        assert!(output.contains("# TYPE mega_physical_drives gauge"));
        assert!(output.contains("mega_physical_drives{slot=\"0\"} 8\n"));
    }

    #[test]
    fn test_collect_snapshot() {
        let mut exporter = RaidExporter::new("mega");
        exporter.collect_snapshot(&snapshot());
        let output = exporter.export();

        assert!(output.contains(
            "mega_virtual_drives{adapter=\"0\",number_of_drives=\"0\",raid_level=\"RAID-5\",size=\"1862G\",state=\"degraded\"} 1\n"
        ));
        assert!(output.contains(
            "mega_physical_drives{adapter=\"0\",brand=\"SEAGATE\",model=\"ST9300605SS\",serial=\"6XP4MQNJ\",size=\"279G\",slot=\"1\",state=\"Failed\"} 9\n"
        ));
        assert!(output.contains("mega_physical_drive_media_errors{"));
        assert!(output.contains("} 12\n"));
        assert!(output.contains("mega_broken_virtual_drives 1\n"));
        assert!(output.contains("mega_broken_physical_drives 1\n"));
    }

    #[test]
    fn test_empty_snapshot_exports_totals_only() {
        let mut exporter = RaidExporter::new("mega");
        exporter.collect_snapshot(&StatusSnapshot::new("/x", 0));
        let output = exporter.export_and_clear();

        assert!(!output.contains("mega_virtual_drives"));
        assert!(output.contains("mega_broken_virtual_drives 0"));
        assert!(output.contains("mega_broken_physical_drives 0"));
        assert!(exporter.export().is_empty());
    }

    #[test]
    fn test_prefix_is_sanitized() {
        let mut exporter = RaidExporter::new("raid-status.host");
        exporter.collect_snapshot(&StatusSnapshot::new("/x", 0));
        assert!(exporter.export().contains("raid_status_host_broken_physical_drives"));
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("Online, Spun Up"), "Online, Spun Up");
        assert_eq!(escape_label_value("a\"b"), "a\\\"b");
        assert_eq!(escape_label_value("a\\b\nc"), "a\\\\b\\nc");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(0.5), "0.5");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    }
}
