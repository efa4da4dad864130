//! Payload shape predicates.
//!
//! Each `PayloadKind` owns one predicate over the raw payload. Predicates are
//! not mutually exclusive (`method-payload` shapes overlap with the delegated
//! families), so callers must evaluate them in `PayloadKind::ORDER`.

use serde_json::Value;

use crate::error::BridgeError;
use crate::protocol::envelope::Envelope;
use crate::protocol::types::ErrorPayload;

/// Payload variants handled by the router itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    GetPermissionRequests,
    PermissionResponse,
    TransactionRequestResponse,
    GetTransactionRequests,
    DisconnectApp,
    Keyring,
    GetFeatures,
    GetNetwork,
    SetNetwork,
    QredoGetPendingRequest,
    QredoGetInfo,
    QredoAccept,
    QredoReject,
    GetStoredEntities,
    GetStorageMigrationStatus,
    DoStorageMigration,
}

impl PayloadKind {
    /// Evaluation priority, highest first.
    pub const ORDER: [PayloadKind; 16] = [
        PayloadKind::GetPermissionRequests,
        PayloadKind::PermissionResponse,
        PayloadKind::TransactionRequestResponse,
        PayloadKind::GetTransactionRequests,
        PayloadKind::DisconnectApp,
        PayloadKind::Keyring,
        PayloadKind::GetFeatures,
        PayloadKind::GetNetwork,
        PayloadKind::SetNetwork,
        PayloadKind::QredoGetPendingRequest,
        PayloadKind::QredoGetInfo,
        PayloadKind::QredoAccept,
        PayloadKind::QredoReject,
        PayloadKind::GetStoredEntities,
        PayloadKind::GetStorageMigrationStatus,
        PayloadKind::DoStorageMigration,
    ];

    /// Route label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKind::GetPermissionRequests => "get-permission-requests",
            PayloadKind::PermissionResponse => "permission-response",
            PayloadKind::TransactionRequestResponse => "transaction-request-response",
            PayloadKind::GetTransactionRequests => "get-transaction-requests",
            PayloadKind::DisconnectApp => "disconnect-app",
            PayloadKind::Keyring => "keyring",
            PayloadKind::GetFeatures => "get-features",
            PayloadKind::GetNetwork => "get-network",
            PayloadKind::SetNetwork => "set-network",
            PayloadKind::QredoGetPendingRequest => "qredo-connect:getPendingRequest",
            PayloadKind::QredoGetInfo => "qredo-connect:getQredoInfo",
            PayloadKind::QredoAccept => "qredo-connect:acceptQredoConnection",
            PayloadKind::QredoReject => "qredo-connect:rejectQredoConnection",
            PayloadKind::GetStoredEntities => "method-payload:getStoredEntities",
            PayloadKind::GetStorageMigrationStatus => "method-payload:getStorageMigrationStatus",
            PayloadKind::DoStorageMigration => "method-payload:doStorageMigration",
        }
    }

    /// Shape predicate for this variant.
    pub fn matches(self, payload: &Value) -> bool {
        match self {
            PayloadKind::GetPermissionRequests => has_type(payload, "get-permission-requests"),
            PayloadKind::PermissionResponse => has_type(payload, "permission-response"),
            PayloadKind::TransactionRequestResponse => {
                has_type(payload, "transaction-request-response")
            }
            PayloadKind::GetTransactionRequests => has_type(payload, "get-transaction-requests"),
            PayloadKind::DisconnectApp => has_type(payload, "disconnect-app"),
            PayloadKind::Keyring => has_type(payload, "keyring"),
            PayloadKind::GetFeatures => has_type(payload, "get-features"),
            PayloadKind::GetNetwork => has_type(payload, "get-network"),
            PayloadKind::SetNetwork => has_type(payload, "set-network"),
            PayloadKind::QredoGetPendingRequest => {
                has_method(payload, "qredo-connect", "getPendingRequest")
            }
            PayloadKind::QredoGetInfo => has_method(payload, "qredo-connect", "getQredoInfo"),
            PayloadKind::QredoAccept => {
                has_method(payload, "qredo-connect", "acceptQredoConnection")
            }
            PayloadKind::QredoReject => {
                has_method(payload, "qredo-connect", "rejectQredoConnection")
            }
            PayloadKind::GetStoredEntities => {
                has_method(payload, "method-payload", "getStoredEntities")
            }
            PayloadKind::GetStorageMigrationStatus => {
                has_method(payload, "method-payload", "getStorageMigrationStatus")
            }
            PayloadKind::DoStorageMigration => {
                has_method(payload, "method-payload", "doStorageMigration")
            }
        }
    }
}

/// First kind in priority order whose predicate accepts `payload`.
pub fn classify(payload: &Value) -> Option<PayloadKind> {
    PayloadKind::ORDER.into_iter().find(|k| k.matches(payload))
}

/// `payload.type` as a string, if present.
pub fn payload_type(payload: &Value) -> Option<&str> {
    payload.get("type").and_then(Value::as_str)
}

fn has_type(payload: &Value, ty: &str) -> bool {
    payload_type(payload) == Some(ty)
}

fn has_method(payload: &Value, ty: &str, method: &str) -> bool {
    has_type(payload, ty) && payload.get("method").and_then(Value::as_str) == Some(method)
}

/// Fault for an envelope nothing claimed.
///
/// The detail is the JSON rendering of the payload discriminator, or of
/// `code-message` when the payload is itself error-shaped.
pub fn unhandled(env: &Envelope) -> BridgeError {
    let detail = match ErrorPayload::peek(&env.payload) {
        Some(err) => Value::String(format!("{}-{}", err.code, err.message)).to_string(),
        None => env
            .payload
            .get("type")
            .map(Value::to_string)
            .unwrap_or_else(|| "undefined".to_string()),
    };
    BridgeError::Unhandled {
        id: env.id_for_display().to_string(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn narrow_method_checks_need_both_discriminators() {
        let p = json!({"type": "qredo-connect", "method": "getQredoInfo"});
        assert_eq!(classify(&p), Some(PayloadKind::QredoGetInfo));

        let wrong_family = json!({"type": "method-payload", "method": "getQredoInfo"});
        assert_eq!(classify(&wrong_family), None);
    }

    #[test]
    fn method_payload_outside_the_local_set_is_left_for_delegates() {
        let p = json!({"type": "method-payload", "method": "createAccounts", "args": {}});
        assert_eq!(classify(&p), None);
    }

    #[test]
    fn unhandled_detail_prefers_error_shape() {
        let env = Envelope {
            id: Some("9".into()),
            payload: json!({"error": true, "code": -1, "message": "nope"}),
        };
        assert_eq!(unhandled(&env).to_string(), r#"Unhandled message 9. ("-1-nope")"#);

        let env = Envelope {
            id: Some("10".into()),
            payload: json!({"type": "teleport"}),
        };
        assert_eq!(unhandled(&env).to_string(), r#"Unhandled message 10. ("teleport")"#);
    }

    #[test]
    fn unhandled_without_type() {
        let env = Envelope { id: None, payload: json!({}) };
        assert_eq!(
            unhandled(&env).to_string(),
            "Unhandled message undefined. (undefined)"
        );
    }
}
