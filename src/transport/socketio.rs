//! Engine.IO v4 / Socket.IO v5 text framing over a websocket.
//!
//! Only the subset a listening client needs is decoded:
//!
//! | frame            | meaning                                  |
//! |------------------|------------------------------------------|
//! | `0{...}`         | engine open, carries ping interval/timeout |
//! | `1`              | engine close                             |
//! | `2` / `3`        | ping / pong                              |
//! | `40{...}`        | namespace connected                      |
//! | `41`             | namespace disconnected                   |
//! | `42["ev",data]`  | event                                    |
//! | `44{...}`        | namespace connect error                  |
//!
//! Namespaces other than `/` and binary attachments are not used by the
//! logger and decode as [`Packet::Other`].

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Reasons a frame cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Zero-length frame.
    #[error("empty frame")]
    Empty,
    /// Open packet body is not a valid handshake.
    #[error("bad open handshake: {0}")]
    Handshake(String),
    /// Event packet body is not a `[name, payload]` array.
    #[error("bad event payload: {0}")]
    Event(String),
}

/// Engine.IO open handshake body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Session id assigned by the server.
    pub sid: String,
    /// Milliseconds between server pings.
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl Handshake {
    /// Longest silence before the server is considered gone.
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO open.
    Open(Handshake),
    /// Engine.IO close.
    Close,
    /// Server heartbeat.
    Ping,
    /// Heartbeat reply.
    Pong,
    /// Namespace joined.
    Connected,
    /// Namespace left by the server.
    Disconnected,
    /// Namespace join refused, with the server's reason.
    ConnectError(String),
    /// Named event with its JSON payload.
    Event {
        /// Event name.
        name: String,
        /// First argument after the name; `null` when absent.
        payload: serde_json::Value,
    },
    /// Well-formed but irrelevant to this client.
    Other(String),
}

impl Packet {
    /// Decode one text frame.
    pub fn decode(frame: &str) -> Result<Packet, FrameError> {
        let mut chars = frame.chars();
        let engine = chars.next().ok_or(FrameError::Empty)?;
        let rest = chars.as_str();

        match engine {
            '0' => serde_json::from_str(rest)
                .map(Packet::Open)
                .map_err(|e| FrameError::Handshake(e.to_string())),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => decode_socket(rest),
            _ => Ok(Packet::Other(frame.to_string())),
        }
    }

    /// Encode the frames this client sends.
    pub fn encode(&self) -> String {
        match self {
            Packet::Pong => "3".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Close => "1".to_string(),
            Packet::Connected => "40".to_string(),
            Packet::Disconnected => "41".to_string(),
            Packet::Event { name, payload } => {
                let array = serde_json::Value::Array(vec![
                    serde_json::Value::String(name.clone()),
                    payload.clone(),
                ]);
                format!("42{array}")
            }
            Packet::Open(_) | Packet::ConnectError(_) | Packet::Other(_) => String::new(),
        }
    }
}

/// Socket.IO packet inside an Engine.IO message (`4…`).
fn decode_socket(rest: &str) -> Result<Packet, FrameError> {
    let mut chars = rest.chars();
    let Some(kind) = chars.next() else {
        return Ok(Packet::Other(format!("4{rest}")));
    };
    let body = chars.as_str();

    // A namespace prefix means the packet is not for the default namespace.
    if body.starts_with('/') {
        return Ok(Packet::Other(format!("4{rest}")));
    }

    match kind {
        '0' => Ok(Packet::Connected),
        '1' => Ok(Packet::Disconnected),
        '2' => decode_event(body),
        '4' => Ok(Packet::ConnectError(connect_error_message(body))),
        _ => Ok(Packet::Other(format!("4{rest}"))),
    }
}

fn decode_event(body: &str) -> Result<Packet, FrameError> {
    // Optional ack id precedes the array.
    let json_start = body
        .find('[')
        .ok_or_else(|| FrameError::Event("missing argument array".to_string()))?;
    let args: Vec<serde_json::Value> = serde_json::from_str(&body[json_start..])
        .map_err(|e| FrameError::Event(e.to_string()))?;

    let mut args = args.into_iter();
    let name = match args.next() {
        Some(serde_json::Value::String(name)) => name,
        _ => return Err(FrameError::Event("event name is not a string".to_string())),
    };
    let payload = args.next().unwrap_or(serde_json::Value::Null);
    Ok(Packet::Event { name, payload })
}

fn connect_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
