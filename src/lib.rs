//! # raidlib
//!
//! RAID controller status from vendor command-line utilities.
//!
//! The controller utility (MegaCli on Linux, mfiutil on FreeBSD) is run once
//! per adapter and query; its text report is parsed into typed records for
//! virtual drives (logical volumes) and physical drives. Reports come in two
//! dialects:
//!
//! - key/value blocks terminated by an `Exit Code:` trailer ([`dialect::keyvalue`])
//! - one-line-per-record tables matched by pattern ([`dialect::tabular`])
//!
//! [`StatusMonitor`] aggregates every adapter into a [`StatusSnapshot`], which
//! can be filtered for broken drives, serialized to JSON or rendered as
//! Prometheus text.
//!
//! # Examples
//!
//! ```no_run
//! use raidlib::{MonitorConfig, StatusMonitor};
//!
//! let config = MonitorConfig {
//!     adapter_count: 2,
//!     ..Default::default()
//! };
//! let mut monitor = StatusMonitor::new(config)?;
//! println!("{}", monitor.refresh()?.to_json_pretty()?);
//! # Ok::<(), raidlib::RaidError>(())
//! ```

pub mod adapter;
pub mod command;
pub mod config;
pub mod dialect;
pub mod error;
pub mod field;
pub mod model;
pub mod prometheus;
pub mod status;

#[cfg(test)]
mod testing;

pub use adapter::{AdapterQuery, ControllerLog};
pub use command::{CommandRunner, SystemRunner};
pub use config::{LogLevel, MonitorConfig};
pub use dialect::{DialectKind, KeyValueDialect, LinePolicy, ReportParser, TabularDialect};
pub use error::{RaidError, Result};
pub use model::{
    AdapterRecord, BrokenDrives, PhysicalDriveRecord, StatusSnapshot, VirtualDriveRecord,
};
pub use prometheus::RaidExporter;
pub use status::StatusMonitor;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
