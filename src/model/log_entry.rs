//! Log entry domain records.
//!
//! A [`LogEntrySummary`] is one row of the live table. A [`LogEntryDetail`]
//! is the full request/response payload for the same `LogId`, fetched on
//! demand for the detail view.

use crate::model::identifiers::{InvalidLogId, LogId};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Why a wire record could not become a domain record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidEntry {
    /// The `_id` field is not a valid [`LogId`].
    #[error("invalid log id: {0}")]
    LogId(#[from] InvalidLogId),

    /// Negative, NaN or infinite duration.
    #[error("duration must be a finite non-negative number, got {0}")]
    Duration(f64),

    /// Timestamp outside the representable range.
    #[error("timestamp out of range: {0}")]
    Timestamp(String),

    /// Status code outside `100..=999`.
    #[error("status code out of range: {0}")]
    Status(i64),

    /// None of the accepted record shapes matched.
    #[error("payload does not match any known log record shape: {0}")]
    Shape(String),
}

// ===== LogEntrySummary =====

/// One recorded request as shown in the table.
///
/// Pure data. Constructed through [`LogEntrySummary::new`] which enforces
/// the non-negative duration invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntrySummary {
    log_id: Option<LogId>,
    method: String,
    path: String,
    status: u16,
    duration_ms: f64,
    timestamp: DateTime<Utc>,
}

impl LogEntrySummary {
    /// Build a summary row.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEntry::Duration`] when `duration_ms` is negative or not finite.
    pub fn new(
        log_id: Option<LogId>,
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        duration_ms: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, InvalidEntry> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(InvalidEntry::Duration(duration_ms));
        }
        Ok(Self {
            log_id,
            method: method.into(),
            path: path.into(),
            status,
            duration_ms,
            timestamp,
        })
    }

    /// Server identifier. `None` for realtime entries pushed before one was assigned.
    pub fn log_id(&self) -> Option<&LogId> {
        self.log_id.as_ref()
    }

    /// HTTP verb as recorded, e.g. `GET`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP status code of the response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Time the server took to answer, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// When the request was received.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Badge classification of [`status`](Self::status).
    pub fn status_class(&self) -> StatusClass {
        StatusClass::of(self.status)
    }
}

// ===== StatusClass =====

/// Badge classification of an HTTP status code.
///
/// Only 200, 201 and 304 count as positive; every other code, including
/// other 2xx codes, gets the error badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 200, 201 or 304.
    Positive,
    /// Anything else.
    Error,
}

impl StatusClass {
    /// Status codes shown with the positive badge.
    pub const POSITIVE_CODES: [u16; 3] = [200, 201, 304];

    /// Classify a status code.
    pub fn of(status: u16) -> Self {
        if Self::POSITIVE_CODES.contains(&status) {
            StatusClass::Positive
        } else {
            StatusClass::Error
        }
    }
}

// ===== LogEntryDetail =====

/// One request header as an ordered key/value record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Header name.
    pub key: String,
    /// Header value, stringified when the wire value was not a string.
    pub value: String,
}

impl Header {
    /// Build a header record.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One fragment of a request or response body.
///
/// Bodies arrive as arbitrary JSON; arrays are split into one fragment per
/// element, anything else is a single fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadFragment(serde_json::Value);

impl PayloadFragment {
    /// Wrap one body value.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The wrapped JSON value.
    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Split a raw body value into ordered fragments. `null` yields none.
    pub fn split_body(body: serde_json::Value) -> Vec<PayloadFragment> {
        match body {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::Array(items) => items.into_iter().map(PayloadFragment).collect(),
            other => vec![PayloadFragment(other)],
        }
    }

    /// Multi-line rendering for the detail view.
    pub fn to_pretty(&self) -> String {
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

impl fmt::Display for PayloadFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// Request half of a full log record.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDetail {
    /// Host the request was addressed to.
    pub hostname: String,
    /// Client IP address.
    pub ip_address: String,
    /// HTTP verb.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Full request URL.
    pub url: String,
    /// Headers in the order they were recorded.
    pub headers: Vec<Header>,
    /// Request body fragments.
    pub body: Vec<PayloadFragment>,
}

/// Response half of a full log record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDetail {
    /// HTTP status code.
    pub status: u16,
    /// Response body fragments.
    pub body: Vec<PayloadFragment>,
}

/// Full record for the detail view, keyed by the same `LogId` as its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntryDetail {
    summary: LogEntrySummary,
    /// Request half.
    pub request: RequestDetail,
    /// Response half.
    pub response: ResponseDetail,
}

impl LogEntryDetail {
    /// Assemble a detail record around its summary.
    pub fn new(summary: LogEntrySummary, request: RequestDetail, response: ResponseDetail) -> Self {
        Self {
            summary,
            request,
            response,
        }
    }

    /// The fields shared with the table row.
    pub fn summary(&self) -> &LogEntrySummary {
        &self.summary
    }

    /// Server identifier shared with the summary row.
    pub fn log_id(&self) -> Option<&LogId> {
        self.summary.log_id()
    }
}
