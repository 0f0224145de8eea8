//! Wire shapes of the Argus REST and realtime payloads.
//!
//! Parse at the boundary: these DTOs mirror the JSON the server sends and
//! are converted into domain records immediately. Two record shapes exist in
//! deployed servers: the nested `{ _id, request, response }` form used by
//! the realtime channel and the detail endpoint, and a flat row form used by
//! some list endpoints. Both are accepted wherever a record is expected.

use crate::model::identifiers::LogId;
use crate::model::log_entry::{
    Header, InvalidEntry, LogEntryDetail, LogEntrySummary, PayloadFragment, RequestDetail,
    ResponseDetail,
};
use crate::model::pagination::PaginationState;
use chrono::{DateTime, Utc};
use serde::Deserialize;

// ===== Envelopes =====

/// `GET {base}/api/logs?page=n&perPage=m`
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope {
    /// Records of the requested page, newest first.
    pub data: Vec<WireLogRecord>,
    /// Server pagination for this page.
    pub record: PageRecord,
}

/// Pagination block of a page response.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct PageRecord {
    /// Total records stored on the server.
    pub total: u64,
    /// Page the server actually returned.
    pub current: u32,
}

/// `GET {base}/api/logs/{logId}`
#[derive(Debug, Clone, Deserialize)]
pub struct DetailEnvelope {
    /// The record, or `null` when the id is unknown.
    #[serde(default)]
    pub data: Option<WireLogRecord>,
}

/// `GET {base}/api/logs/config`
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Whether the dashboard sits behind the login gate.
    #[serde(default)]
    pub authentication: bool,
}

/// Decoded page: entries in server order plus authoritative pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Rows in server order.
    pub entries: Vec<LogEntrySummary>,
    /// Server-reported total record count.
    pub total_count: u64,
    /// 1-based page the server returned.
    pub current_page: u32,
}

impl FetchedPage {
    /// Pagination state for this result, given the page size that was requested.
    pub fn pagination(&self, page_size: u32) -> PaginationState {
        PaginationState::new(self.current_page, page_size, self.total_count)
    }
}

impl PageEnvelope {
    /// Convert every record into a summary row.
    ///
    /// # Errors
    ///
    /// Fails on the first record that is not a valid summary.
    pub fn into_page(self) -> Result<FetchedPage, InvalidEntry> {
        let entries = self
            .data
            .into_iter()
            .map(WireLogRecord::into_summary)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FetchedPage {
            entries,
            total_count: self.record.total,
            current_page: self.record.current.max(1),
        })
    }
}

// ===== Records =====

/// Either record shape. Nested is tried first since it is a strict superset.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireLogRecord {
    /// `{ _id, request, response }` form.
    Nested(NestedRecord),
    /// Flat row form.
    Flat(FlatRecord),
}

/// Record with separate request and response objects.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedRecord {
    /// Server identifier.
    #[serde(default, rename = "_id", alias = "id", alias = "logId")]
    pub id: Option<String>,
    /// Request half.
    pub request: WireRequest,
    /// Response half.
    pub response: WireResponse,
    /// Server-side total at push time; only present on realtime events.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Request half of a nested record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    /// HTTP verb.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Milliseconds taken; absent on some older servers.
    #[serde(default)]
    pub duration: Option<f64>,
    /// When the request was received.
    pub timestamp: WireTimestamp,
    /// Host the request was addressed to.
    #[serde(default)]
    pub hostname: Option<String>,
    /// Client IP address.
    #[serde(default, alias = "ip")]
    pub ip_address: Option<String>,
    /// Full request URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Request headers.
    #[serde(default)]
    pub headers: WireHeaders,
    /// Request body, any JSON.
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Response half of a nested record.
#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse {
    /// HTTP status code, range-checked on conversion.
    pub status: i64,
    /// Response body, any JSON.
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Single-level row as returned by some list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatRecord {
    /// Server identifier.
    #[serde(default, rename = "_id", alias = "id", alias = "logId")]
    pub id: Option<String>,
    /// HTTP verb.
    pub method: String,
    /// Request path.
    pub path: String,
    /// HTTP status code.
    pub status: i64,
    /// Milliseconds taken.
    #[serde(default, alias = "durationMs")]
    pub duration: Option<f64>,
    /// When the request was received.
    pub timestamp: WireTimestamp,
}

/// Epoch milliseconds or an RFC 3339 string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    /// Integral epoch milliseconds.
    Millis(i64),
    /// Fractional epoch milliseconds, rounded.
    FractionalMillis(f64),
    /// RFC 3339 date-time.
    Text(String),
}

impl WireTimestamp {
    /// Convert to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEntry::Timestamp`] when the value is out of range or not RFC 3339.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, InvalidEntry> {
        match self {
            WireTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms)
                .ok_or_else(|| InvalidEntry::Timestamp(ms.to_string())),
            WireTimestamp::FractionalMillis(ms) => {
                if !ms.is_finite() {
                    return Err(InvalidEntry::Timestamp(ms.to_string()));
                }
                DateTime::from_timestamp_millis(ms.round() as i64)
                    .ok_or_else(|| InvalidEntry::Timestamp(ms.to_string()))
            }
            WireTimestamp::Text(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| InvalidEntry::Timestamp(raw.clone())),
        }
    }
}

/// Headers arrive either as a JSON object or as a list of `{key, value}` records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireHeaders {
    /// `{"accept": "*/*"}` form.
    Map(serde_json::Map<String, serde_json::Value>),
    /// `[{"key": "accept", "value": "*/*"}]` form.
    List(Vec<WireHeader>),
}

impl Default for WireHeaders {
    fn default() -> Self {
        WireHeaders::List(Vec::new())
    }
}

/// One entry of the list header form.
#[derive(Debug, Clone, Deserialize)]
pub struct WireHeader {
    /// Header name.
    #[serde(alias = "name")]
    pub key: String,
    /// Header value, any JSON.
    pub value: serde_json::Value,
}

impl WireHeaders {
    fn into_headers(self) -> Vec<Header> {
        match self {
            WireHeaders::Map(map) => map
                .into_iter()
                .map(|(key, value)| Header::new(key, header_value(value)))
                .collect(),
            WireHeaders::List(list) => list
                .into_iter()
                .map(|h| Header::new(h.key, header_value(h.value)))
                .collect(),
        }
    }
}

fn header_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn parse_log_id(raw: Option<String>) -> Result<Option<LogId>, InvalidEntry> {
    match raw {
        Some(s) if !s.trim().is_empty() => Ok(Some(LogId::new(s)?)),
        _ => Ok(None),
    }
}

fn parse_status(raw: i64) -> Result<u16, InvalidEntry> {
    u16::try_from(raw)
        .ok()
        .filter(|s| (100..=999).contains(s))
        .ok_or(InvalidEntry::Status(raw))
}

impl WireLogRecord {
    /// Convert into a table row.
    ///
    /// # Errors
    ///
    /// Fails when the id, status, duration or timestamp is invalid.
    pub fn into_summary(self) -> Result<LogEntrySummary, InvalidEntry> {
        match self {
            WireLogRecord::Nested(rec) => LogEntrySummary::new(
                parse_log_id(rec.id)?,
                rec.request.method,
                rec.request.path,
                parse_status(rec.response.status)?,
                rec.request.duration.unwrap_or(0.0),
                rec.request.timestamp.to_datetime()?,
            ),
            WireLogRecord::Flat(rec) => LogEntrySummary::new(
                parse_log_id(rec.id)?,
                rec.method,
                rec.path,
                parse_status(rec.status)?,
                rec.duration.unwrap_or(0.0),
                rec.timestamp.to_datetime()?,
            ),
        }
    }

    /// Convert into a full detail record. Flat rows yield empty request extras.
    ///
    /// # Errors
    ///
    /// Same as [`into_summary`](Self::into_summary).
    pub fn into_detail(self) -> Result<LogEntryDetail, InvalidEntry> {
        match self {
            WireLogRecord::Nested(rec) => {
                let status = parse_status(rec.response.status)?;
                let summary = LogEntrySummary::new(
                    parse_log_id(rec.id)?,
                    rec.request.method.clone(),
                    rec.request.path.clone(),
                    status,
                    rec.request.duration.unwrap_or(0.0),
                    rec.request.timestamp.to_datetime()?,
                )?;
                let url = rec.request.url.unwrap_or_else(|| rec.request.path.clone());
                let request = RequestDetail {
                    hostname: rec.request.hostname.unwrap_or_default(),
                    ip_address: rec.request.ip_address.unwrap_or_default(),
                    method: rec.request.method,
                    path: rec.request.path,
                    url,
                    headers: rec.request.headers.into_headers(),
                    body: PayloadFragment::split_body(rec.request.body),
                };
                let response = ResponseDetail {
                    status,
                    body: PayloadFragment::split_body(rec.response.body),
                };
                Ok(LogEntryDetail::new(summary, request, response))
            }
            flat @ WireLogRecord::Flat(_) => {
                let summary = flat.into_summary()?;
                let request = RequestDetail {
                    hostname: String::new(),
                    ip_address: String::new(),
                    method: summary.method().to_string(),
                    path: summary.path().to_string(),
                    url: summary.path().to_string(),
                    headers: Vec::new(),
                    body: Vec::new(),
                };
                let response = ResponseDetail {
                    status: summary.status(),
                    body: Vec::new(),
                };
                Ok(LogEntryDetail::new(summary, request, response))
            }
        }
    }
}

// ===== Realtime =====

/// Decoded `new_request` push.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeLogEvent {
    /// The pushed row.
    pub entry: LogEntrySummary,
    /// Server-reported total at push time, if the server sent one.
    pub total: Option<u64>,
}

impl RealtimeLogEvent {
    /// Decode a `new_request` payload.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEntry::Shape`] when the payload is not a nested record.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, InvalidEntry> {
        let record: NestedRecord = serde_json::from_value(payload.clone())
            .map_err(|e| InvalidEntry::Shape(e.to_string()))?;
        let total = record.total;
        let entry = WireLogRecord::Nested(record).into_summary()?;
        Ok(Self { entry, total })
    }
}
