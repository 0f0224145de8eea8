//! Identifier newtypes with smart constructors.
//!
//! Identifiers validate non-empty strings at construction time.
//! The raw constructor is never exported - use the smart constructor only.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Opaque server-assigned identifier of one recorded request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogId(String);

impl LogId {
    /// Smart constructor: validates non-empty, non-blank identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidLogId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidLogId::Empty);
        }
        if raw.contains('/') {
            return Err(InvalidLogId::PathSeparator(raw));
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LogId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        LogId::new(raw).map_err(serde::de::Error::custom)
    }
}

// ===== Error Types =====

/// Why a raw string is not a usable [`LogId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLogId {
    /// Empty or whitespace only.
    #[error("Log ID cannot be empty")]
    Empty,
    /// The identifier is interpolated into `{base}/api/logs/{logId}`.
    #[error("Log ID cannot contain '/': {0}")]
    PathSeparator(String),
}
