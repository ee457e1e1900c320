//! Field coercion for `Label: value` report lines.
//!
//! Every numeric or text conversion of a report value goes through
//! [`parse_field`] (labelled lines) or [`coerce`] (pattern captures);
//! parsers never re-parse a coerced value.

use crate::error::{RaidError, Result};

/// Target kind of a coerced field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed remainder, verbatim (may be empty)
    Text,
    /// Base-10 signed integer
    Integer,
    /// Base-10 unsigned 64-bit integer
    Unsigned64,
}

/// A coerced field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Unsigned64(u64),
}

impl FieldValue {
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Unsigned64(v) => v.to_string(),
        }
    }
}

/// Split `line` on its first colon, trim the value and convert it to `kind`.
///
/// Fails with [`RaidError::MalformedLine`] when the line has no colon and with
/// [`RaidError::MalformedField`] when the value is not a valid number.
pub fn parse_field(line: &str, kind: FieldKind) -> Result<FieldValue> {
    let (_, raw) = line
        .split_once(':')
        .ok_or_else(|| RaidError::MalformedLine(line.to_string()))?;
    convert(line, raw.trim(), kind)
}

/// Convert a bare value (no label) captured by a report pattern.
pub fn coerce(value: &str, kind: FieldKind) -> Result<FieldValue> {
    convert(value, value.trim(), kind)
}

fn convert(line: &str, value: &str, kind: FieldKind) -> Result<FieldValue> {
    match kind {
        FieldKind::Text => Ok(FieldValue::Text(value.to_string())),
        FieldKind::Integer => value
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|e| malformed(line, e)),
        FieldKind::Unsigned64 => value
            .parse::<u64>()
            .map(FieldValue::Unsigned64)
            .map_err(|e| malformed(line, e)),
    }
}

pub fn text_field(line: &str) -> Result<String> {
    parse_field(line, FieldKind::Text).map(FieldValue::into_text)
}

pub fn integer_field(line: &str) -> Result<i64> {
    match parse_field(line, FieldKind::Integer)? {
        FieldValue::Integer(v) => Ok(v),
        other => Err(malformed(line, format!("unexpected value {:?}", other))),
    }
}

pub fn unsigned_field(line: &str) -> Result<u64> {
    match parse_field(line, FieldKind::Unsigned64)? {
        FieldValue::Unsigned64(v) => Ok(v),
        other => Err(malformed(line, format!("unexpected value {:?}", other))),
    }
}

/// Integer field narrowed to a non-negative `u32` (indices, ids, counts).
pub fn index_field(line: &str) -> Result<u32> {
    let value = integer_field(line)?;
    u32::try_from(value).map_err(|e| malformed(line, e))
}

/// Bare integer value narrowed to a non-negative `u32`.
pub fn index_value(value: &str) -> Result<u32> {
    match coerce(value, FieldKind::Integer)? {
        FieldValue::Integer(v) => u32::try_from(v).map_err(|e| malformed(value, e)),
        other => Err(malformed(value, format!("unexpected value {:?}", other))),
    }
}

fn malformed(line: &str, reason: impl std::fmt::Display) -> RaidError {
    RaidError::MalformedField {
        line: line.to_string(),
        reason: reason.to_string(),
    }
}
