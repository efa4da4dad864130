//! Message envelope (JSON text frame).
//!
//! The payload is kept as a `serde_json::Value`: classification inspects its
//! shape field by field before any typed decoding happens.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Correlation id supplied by the UI and echoed back on the reply.
pub type CorrelationId = String;

/// `{ id, payload }` unit exchanged over the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation id. Omitted on push notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CorrelationId>,
    /// Opaque payload, classified by shape.
    pub payload: Value,
}

impl Envelope {
    /// Reply correlated with a request id.
    pub fn reply(id: Option<CorrelationId>, payload: Value) -> Self {
        Self { id, payload }
    }

    /// Unsolicited envelope without correlation id.
    pub fn push(payload: Value) -> Self {
        Self { id: None, payload }
    }

    /// Decode one inbound text frame.
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame).map_err(|e| BridgeError::InvalidPayload {
            kind: "envelope",
            reason: e.to_string(),
        })
    }

    /// Encode into a single text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| BridgeError::Internal(format!("envelope encode failed: {e}")))
    }

    /// Id used in diagnostics; `undefined` when the sender omitted it.
    pub fn id_for_display(&self) -> &str {
        self.id.as_deref().unwrap_or("undefined")
    }
}
