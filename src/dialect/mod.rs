//! Controller report dialects.
//!
//! Two report grammars are supported, one per platform family:
//!
//! - [`keyvalue`]: MegaCli `Key: Value` blocks terminated by an `Exit Code:` trailer
//! - [`tabular`]: mfiutil one-line-per-record tables matched by pattern
//!
//! Both implement [`ReportParser`]; the dialect is picked from configuration
//! (whose default depends on the build target), never from report content.

pub mod keyvalue;
pub mod tabular;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{PhysicalDriveRecord, VirtualDriveRecord};

pub use keyvalue::KeyValueDialect;
pub use tabular::TabularDialect;

/// Placeholder replaced by the adapter index in argument templates
pub const ADAPTER_PLACEHOLDER: &str = "{adapter}";

/// How the key/value parser treats a line whose value fails coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePolicy {
    /// Abort the whole parse with the coercion error
    Strict,
    /// Log and skip the offending line
    #[default]
    Lenient,
}

/// Which report grammar the controller utility speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// MegaCli key/value blocks
    KeyValue,
    /// mfiutil single-line table
    Tabular,
}

impl Default for DialectKind {
    fn default() -> Self {
        if cfg!(target_os = "freebsd") {
            DialectKind::Tabular
        } else {
            DialectKind::KeyValue
        }
    }
}

impl DialectKind {
    /// Build the parser for this dialect with its stock markers and patterns.
    pub fn parser(self, policy: LinePolicy) -> Result<Box<dyn ReportParser>> {
        Ok(match self {
            DialectKind::KeyValue => Box::new(KeyValueDialect::megacli(policy)),
            DialectKind::Tabular => Box::new(TabularDialect::mfiutil()?),
        })
    }
}

impl std::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyValue => write!(f, "key_value"),
            Self::Tabular => write!(f, "tabular"),
        }
    }
}

impl std::str::FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "key_value" | "keyvalue" | "megacli" => Ok(Self::KeyValue),
            "tabular" | "mfiutil" => Ok(Self::Tabular),
            other => Err(format!("unknown dialect: {}", other)),
        }
    }
}

impl std::str::FromStr for LinePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown line policy: {}", other)),
        }
    }
}

/// A report grammar: the queries to run and how to read their output.
pub trait ReportParser: Send + Sync {
    /// Arguments of the virtual-drive query for `adapter`.
    fn volume_args(&self, adapter: u32) -> String;

    /// Arguments of the physical-drive query for `adapter`.
    fn drive_args(&self, adapter: u32) -> String;

    /// Arguments of the controller event-log query for `adapter`.
    fn log_args(&self, adapter: u32) -> String;

    /// Check the raw output for command success and return the part to parse.
    ///
    /// Dialects without an embedded result code pass the output through.
    fn validate<'a>(&self, raw: &'a str) -> Result<&'a str> {
        Ok(raw)
    }

    fn parse_virtual_drives(&self, report: &str) -> Result<Vec<VirtualDriveRecord>>;

    fn parse_physical_drives(&self, report: &str) -> Result<Vec<PhysicalDriveRecord>>;
}

/// Substitute the adapter index into an argument template.
pub fn expand_args(template: &str, adapter: u32) -> String {
    template.replace(ADAPTER_PLACEHOLDER, &adapter.to_string())
}
