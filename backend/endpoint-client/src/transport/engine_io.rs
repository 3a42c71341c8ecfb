//! Engine.IO v4 packet framing over websocket text frames.
//!
//! Each text frame is one packet: a single-digit type followed by an optional
//! payload. Binary websocket frames carry binary messages and are not packets.

use crate::error::transport::TransportError;

use std::time::Duration;

use serde::Deserialize;

pub const PROTOCOL_VERSION: &str = "4";
pub const TRANSPORT_NAME: &str = "websocket";

const OPEN: char = '0';
const CLOSE: char = '1';
const PING: char = '2';
const PONG: char = '3';
const MESSAGE: char = '4';
const UPGRADE: char = '5';
const NOOP: char = '6';

/// Payload of the server's open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl OpenHandshake {
    /// Longest silence tolerated before the server is considered gone.
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl Packet {
    pub fn parse(frame: &str) -> Result<Packet, TransportError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| TransportError::framing("Empty Engine.IO packet"))?;
        let payload = chars.as_str();

        match kind {
            OPEN => serde_json::from_str(payload)
                .map(Packet::Open)
                .map_err(|e| TransportError::handshake(format!("Invalid open packet: {e}"))),
            CLOSE => Ok(Packet::Close),
            PING => Ok(Packet::Ping(payload.to_string())),
            PONG => Ok(Packet::Pong(payload.to_string())),
            MESSAGE => Ok(Packet::Message(payload.to_string())),
            UPGRADE => Ok(Packet::Upgrade),
            NOOP => Ok(Packet::Noop),
            other => Err(TransportError::framing(format!(
                "Unknown Engine.IO packet type '{other}'"
            ))),
        }
    }

    /// Text frame for the packets a client sends.
    pub fn encode(&self) -> String {
        match self {
            Packet::Open(_) => OPEN.to_string(),
            Packet::Close => CLOSE.to_string(),
            Packet::Ping(payload) => format!("{PING}{payload}"),
            Packet::Pong(payload) => format!("{PONG}{payload}"),
            Packet::Message(payload) => format!("{MESSAGE}{payload}"),
            Packet::Upgrade => UPGRADE.to_string(),
            Packet::Noop => NOOP.to_string(),
        }
    }
}
