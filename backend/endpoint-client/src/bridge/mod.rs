//! Glue between the transport and the RPC engine.
//!
//! Outbound, an [`OutboundSink`] encodes each [`RpcMessage`] as JSON text and
//! queues it on the transport. Inbound, [`pump_inbound`] decodes every wire
//! message and hands it to [`RpcEngine::handle_message`] in arrival order. No
//! buffering beyond the transport channel and no payload rewriting.

use crate::error::bridge::BridgeError;
use crate::rpc::RpcEngine;
use crate::session::close::CloseNotifier;
use crate::transport::{CloseReason, TransportEvent, TransportEvents, TransportHandle, WireMessage};

use std::sync::Arc;

use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One RPC message: a JSON object whose fields belong to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpcMessage(Map<String, Value>);

impl RpcMessage {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl TryFrom<Value> for RpcMessage {
    type Error = BridgeError;

    #[track_caller]
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(RpcMessage(fields)),
            other => Err(BridgeError::decode(format!(
                "RPC message must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

pub fn encode(message: &RpcMessage) -> Result<String, BridgeError> {
    serde_json::to_string(message).map_err(|e| BridgeError::encode(e.to_string()))
}

/// Decode a wire message into an RPC message.
///
/// Only text frames carrying a JSON object are valid.
pub fn decode(message: &WireMessage) -> Result<RpcMessage, BridgeError> {
    match message {
        WireMessage::Text(text) => {
            let value: Value = serde_json::from_str(text)
                .map_err(|e| BridgeError::decode(format!("Invalid JSON: {e}")))?;
            RpcMessage::try_from(value)
        }
        WireMessage::Binary(data) => Err(BridgeError::decode(format!(
            "Binary frames are not RPC messages ({} bytes)",
            data.len()
        ))),
    }
}

/// Outbound function handed to the RPC engine.
#[derive(Debug, Clone)]
pub struct OutboundSink {
    transport: TransportHandle,
}

impl OutboundSink {
    pub fn new(transport: TransportHandle) -> Self {
        Self { transport }
    }

    pub fn send(&self, message: &RpcMessage) -> Result<(), BridgeError> {
        let text = encode(message)?;
        self.transport.send(text)?;
        Ok(())
    }
}

/// Feed transport events into the engine until the transport closes, then
/// fire the close notification.
///
/// A message that fails to decode is logged and dropped; later messages are
/// still delivered.
pub(crate) async fn pump_inbound<E: RpcEngine>(
    engine: Arc<E>,
    mut events: TransportEvents,
    notifier: CloseNotifier,
) {
    while let Some(event) = events.next().await {
        match event {
            TransportEvent::Message(wire) => match decode(&wire) {
                Ok(message) => engine.handle_message(message),
                Err(e) => error!("Dropping inbound message: {e}"),
            },
            TransportEvent::Closed(reason) => {
                debug!("Inbound pump stopping: {reason}");
                notifier.notify(reason);
                return;
            }
        }
    }
    notifier.notify(CloseReason::ConnectionLost);
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
