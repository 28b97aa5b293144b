//! Socket.IO v5 / Engine.IO v4 text framing over a websocket.
//!
//! Only the default namespace and text frames are supported. Engine.IO
//! wraps every Socket.IO packet in a `4` (message) packet, so an event on
//! the wire looks like `42["move:made",{"fen":"..."}]`.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Path and query of the Engine.IO websocket endpoint.
pub const ENDPOINT_PATH: &str = "/socket.io/";
pub const ENDPOINT_QUERY: &str = "EIO=4&transport=websocket";

/// Engine.IO defaults: 25s ping interval plus 20s ping timeout.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_millis(45_000);

/// Session parameters sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: u64,
}

impl Handshake {
    /// How long the server may stay silent before the connection is dead.
    pub fn heartbeat_timeout(&self) -> Duration {
        match self.ping_interval.saturating_add(self.ping_timeout) {
            0 => DEFAULT_HEARTBEAT,
            millis => Duration::from_millis(millis),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connect,
    Disconnect,
    Event { name: String, args: Vec<Value> },
    ConnectError(String),
}

pub fn decode(text: &str) -> Result<Frame, ProtocolError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(Frame::Open)
            .map_err(|e| ProtocolError::Json(e.to_string())),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping),
        '3' => Ok(Frame::Pong),
        '4' => decode_message(rest),
        '6' => Ok(Frame::Noop),
        other => Err(ProtocolError::UnknownPacket(other)),
    }
}

fn decode_message(text: &str) -> Result<Frame, ProtocolError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    let body = chars.as_str();

    match kind {
        // The connect ack may carry `{"sid":...}`, which we have no use for
        '0' => Ok(Frame::Connect),
        '1' => Ok(Frame::Disconnect),
        '2' => decode_event(body),
        '4' => {
            let reason = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| body.to_string());
            Ok(Frame::ConnectError(reason))
        }
        other => Err(ProtocolError::UnknownMessage(other)),
    }
}

fn decode_event(body: &str) -> Result<Frame, ProtocolError> {
    // Skip the ack id, if any
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());

    let mut values: Vec<Value> =
        serde_json::from_str(body).map_err(|e| ProtocolError::Json(e.to_string()))?;
    if values.is_empty() {
        return Err(ProtocolError::MissingEventName);
    }

    match values.remove(0) {
        Value::String(name) => Ok(Frame::Event { name, args: values }),
        _ => Err(ProtocolError::MissingEventName),
    }
}

pub fn encode(frame: &Frame) -> String {
    match frame {
        Frame::Open(handshake) => format!(
            "0{}",
            serde_json::to_value(handshake).unwrap_or(Value::Null)
        ),
        Frame::Close => "1".to_string(),
        Frame::Ping => "2".to_string(),
        Frame::Pong => "3".to_string(),
        Frame::Noop => "6".to_string(),
        Frame::Connect => "40".to_string(),
        Frame::Disconnect => "41".to_string(),
        Frame::Event { name, args } => {
            let mut values = Vec::with_capacity(args.len() + 1);
            values.push(Value::String(name.clone()));
            values.extend(args.iter().cloned());
            format!("42{}", Value::Array(values))
        }
        Frame::ConnectError(reason) => {
            format!("44{}", serde_json::json!({ "message": reason }))
        }
    }
}
