//! Domain values shared by requests, replies, and collaborators.
//!
//! Records owned by collaborators (permissions, transaction requests,
//! serialized accounts) stay opaque `Value`s: the router forwards them as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Collections the UI can fetch through getStoredEntities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UiEntityType {
    Accounts,
    AccountSources,
}

impl UiEntityType {
    /// Parse a wire tag. Anything else is an unknown entity type.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "accounts" => Ok(UiEntityType::Accounts),
            "accountSources" => Ok(UiEntityType::AccountSources),
            other => Err(BridgeError::UnknownEntityType(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UiEntityType::Accounts => "accounts",
            UiEntityType::AccountSources => "accountSources",
        }
    }
}

/// Active network selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEnv {
    pub env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rpc_url: Option<String>,
}

/// "Active browsing context changed" event from the origin tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOrigin {
    pub origin: String,
    #[serde(rename = "favIcon", default, skip_serializing_if = "Option::is_none")]
    pub fav_icon: Option<String>,
}

/// Feature flags plus the attributes they were evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub features: Value,
    pub attributes: Value,
}

/// Storage migration progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationStatus {
    Required,
    InProgress,
    Ready,
}

/// Error-shaped payload: `{ error: true, code, message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: bool,
    pub code: i64,
    pub message: String,
}

impl ErrorPayload {
    /// Wire error with the shared code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: true,
            code: crate::error::WIRE_ERROR_CODE,
            message: message.into(),
        }
    }

    /// Read an error-shaped payload, if `payload` is one.
    pub fn peek(payload: &Value) -> Option<Self> {
        if payload.get("error").and_then(Value::as_bool) != Some(true) {
            return None;
        }
        Some(Self {
            error: true,
            code: payload.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}
