//! Monitor configuration
//!
//! Loaded from TOML; every key is optional and falls back to the defaults of
//! the build target.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::dialect::{DialectKind, LinePolicy};
use crate::error::{RaidError, Result};

/// MegaCli install location on Linux hosts
pub const MEGACLI_PATH: &str = "/opt/MegaRAID/MegaCli/MegaCli64";

/// mfiutil location on FreeBSD
pub const MFIUTIL_PATH: &str = "/usr/sbin/mfiutil";

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Controller utility executable
    pub utility_path: PathBuf,
    /// Adapters are queried as 0..adapter_count
    pub adapter_count: u32,
    pub dialect: DialectKind,
    pub line_policy: LinePolicy,
    /// Metric name prefix for the Prometheus exposition
    pub metric_prefix: String,
    pub log_level: LogLevel,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let dialect = DialectKind::default();
        let utility_path = match dialect {
            DialectKind::KeyValue => MEGACLI_PATH,
            DialectKind::Tabular => MFIUTIL_PATH,
        };
        Self {
            utility_path: PathBuf::from(utility_path),
            adapter_count: 1,
            dialect,
            line_policy: LinePolicy::default(),
            metric_prefix: "mega".into(),
            log_level: LogLevel::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RaidError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RaidError::Configuration(format!("TOML parse error: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| RaidError::Configuration(format!("TOML encode error: {}", e)))
    }

    /// Generate sample config
    pub fn sample_toml() -> String {
        r#"# raidstat configuration
# Controller utility; mfiutil on FreeBSD, MegaCli elsewhere
utility_path = "/opt/MegaRAID/MegaCli/MegaCli64"
# Adapters 0..adapter_count are queried
adapter_count = 1
# "key_value" (MegaCli) or "tabular" (mfiutil)
dialect = "key_value"
# "lenient" skips unparsable report lines, "strict" rejects the report
line_policy = "lenient"
metric_prefix = "mega"
log_level = "Warn"
"#
        .into()
    }
}

/// Lexically normalise a path: drop `.` components and redundant separators.
///
/// `..` is kept; the filesystem is not consulted.
pub fn clean_path(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
