//! Error types for the argus dashboard.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error for startup and terminal failures
//!   - [`FetchError`] - REST failures (unreachable, non-success status, bad body, unknown id)
//!   - [`ChannelError`] - Realtime channel failures (handshake, lost connection, bad frame)
//!   - `std::io::Error` - Terminal/TUI rendering failures
//!
//! # Recovery Strategy
//!
//! Fetch and channel errors are **non-fatal**. The pagination controller and
//! detail loader turn fetch errors into visible state; channel errors degrade
//! the live indicator while the table keeps showing REST data. Only startup
//! and terminal errors end the process.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::session::SessionError;
use thiserror::Error;

/// Top-level application error.
///
/// Everything that reaches this type is fatal: the dashboard cannot start
/// or cannot keep drawing.
#[derive(Debug, Error)]
pub enum AppError {
    /// Config file exists but could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Session file could not be read or written (`--login`, `--logout`).
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// HTTP client could not be constructed.
    #[error("Transport setup failed: {0}")]
    Transport(String),

    /// Terminal or TUI rendering error.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Errors returned by the REST side of the transport client.
///
/// Carries owned strings rather than the HTTP client's error type so the
/// error can be stored in UI state and compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Endpoint unreachable, timed out, or answered with a non-success status.
    #[error("Network error: {reason}")]
    Network {
        /// Human-readable cause (transport error or status line).
        reason: String,
        /// HTTP status when the server answered at all.
        status: Option<u16>,
    },

    /// Response body was not the expected JSON shape.
    #[error("Malformed response from {endpoint}: {reason}")]
    Parse {
        /// Endpoint path that produced the body.
        endpoint: String,
        /// Deserialization error details.
        reason: String,
    },

    /// Detail fetch for an identifier the server does not know.
    #[error("Log entry not found: {log_id}")]
    NotFound {
        /// The identifier that was requested.
        log_id: String,
    },
}

impl FetchError {
    /// Transport failure with no HTTP status.
    pub fn network(reason: impl Into<String>) -> Self {
        FetchError::Network {
            reason: reason.into(),
            status: None,
        }
    }

    /// Non-success HTTP status.
    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        FetchError::Network {
            reason: reason.into(),
            status: Some(status),
        }
    }

    /// Body from `endpoint` did not decode.
    pub fn parse(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::Parse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Short label for the status bar.
    pub fn kind_label(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network error",
            FetchError::Parse { .. } => "bad response",
            FetchError::NotFound { .. } => "not found",
        }
    }
}

/// Errors raised by the realtime channel.
///
/// Never fatal: the channel thread reports them as a `disconnect` event and
/// retries with backoff.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Websocket handshake or TCP connect failed.
    #[error("Realtime connection failed: {0}")]
    Connect(String),

    /// Established connection dropped.
    #[error("Realtime connection lost: {0}")]
    Lost(String),

    /// Server refused the namespace connect (`44` packet).
    #[error("Realtime namespace rejected: {0}")]
    Rejected(String),

    /// Frame could not be decoded.
    #[error("Malformed realtime frame: {0}")]
    Frame(String),

    /// Server sent nothing within the negotiated ping window.
    #[error("Realtime heartbeat timed out")]
    HeartbeatTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_identifier() {
        let err = FetchError::NotFound {
            log_id: "missing".to_string(),
        };
        assert!(err.to_string().contains("missing"));
        assert_eq!(err.kind_label(), "not found");
    }

    #[test]
    fn status_constructor_keeps_code() {
        let err = FetchError::status(503, "503 Service Unavailable");
        assert_eq!(
            err,
            FetchError::Network {
                reason: "503 Service Unavailable".to_string(),
                status: Some(503),
            }
        );
    }

    #[test]
    fn app_error_from_io_error() {
        let io_err = std::io::Error::other("broken pipe");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Terminal(_)));
    }

    #[test]
    fn channel_error_display_is_descriptive() {
        let err = ChannelError::Connect("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Realtime connection failed: connection refused"
        );
    }
}
