//! Shared error type across uiBridge crates.

use thiserror::Error;

/// Error code carried by every error reply on the wire.
///
/// The UI does not branch on fault kinds, so all faults share one code.
pub const WIRE_ERROR_CODE: i64 = -1;

/// Fault classification used in logs and metrics labels (never on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// No classifier step matched and no delegate claimed the message.
    Unhandled,
    /// A step matched but the payload fields did not decode.
    InvalidPayload,
    /// getStoredEntities with a tag outside `accounts` / `accountSources`.
    UnknownEntityType,
    /// An external collaborator failed.
    Collaborator,
    /// The outbound channel is gone.
    ChannelClosed,
    /// Configuration rejected at startup.
    Config,
    /// Internal error.
    Internal,
}

impl FaultKind {
    /// String representation used in log fields and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::Unhandled => "UNHANDLED",
            FaultKind::InvalidPayload => "INVALID_PAYLOAD",
            FaultKind::UnknownEntityType => "UNKNOWN_ENTITY_TYPE",
            FaultKind::Collaborator => "COLLABORATOR",
            FaultKind::ChannelClosed => "CHANNEL_CLOSED",
            FaultKind::Config => "CONFIG",
            FaultKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type used by core and gateway.
///
/// `Display` is the text placed in the `message` field of an error reply.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Unhandled message {id}. ({detail})")]
    Unhandled { id: String, detail: String },
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },
    #[error("Unknown entity type {0}")]
    UnknownEntityType(String),
    #[error("{0}")]
    Collaborator(String),
    #[error("channel closed")]
    ChannelClosed,
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Shorthand for collaborator failures.
    pub fn collaborator(msg: impl Into<String>) -> Self {
        BridgeError::Collaborator(msg.into())
    }

    /// Map the error to its fault classification.
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            BridgeError::Unhandled { .. } => FaultKind::Unhandled,
            BridgeError::InvalidPayload { .. } => FaultKind::InvalidPayload,
            BridgeError::UnknownEntityType(_) => FaultKind::UnknownEntityType,
            BridgeError::Collaborator(_) => FaultKind::Collaborator,
            BridgeError::ChannelClosed => FaultKind::ChannelClosed,
            BridgeError::Config(_) | BridgeError::UnsupportedVersion => FaultKind::Config,
            BridgeError::Internal(_) => FaultKind::Internal,
        }
    }
}
