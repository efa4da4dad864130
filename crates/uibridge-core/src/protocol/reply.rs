//! Outbound payload builders.
//!
//! Correlated replies (`Reply`) and unsolicited pushes (`Push`) are kept apart
//! so a push can never be sent with a request id.

use serde_json::{json, Value};

use crate::protocol::types::{
    ActiveOrigin, ErrorPayload, FeatureSnapshot, MigrationStatus, NetworkEnv, UiEntityType,
};

/// Reply to a request; sent with the request's id.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Bare acknowledgement.
    Done,
    PermissionRequests(Vec<Value>),
    TransactionRequests(Vec<Value>),
    Keyring { method: String, value: Value },
    Features(FeatureSnapshot),
    Network(NetworkEnv),
    QredoPendingRequest(Option<Value>),
    QredoInfo(Value),
    QredoAccepted(Vec<Value>),
    StoredEntities {
        entity_type: UiEntityType,
        entities: Vec<Value>,
    },
    StorageMigrationStatus(MigrationStatus),
    Error(ErrorPayload),
}

impl Reply {
    /// Error reply carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(ErrorPayload::new(message))
    }

    pub fn into_payload(self) -> Value {
        match self {
            Reply::Done => json!({ "type": "done" }),
            Reply::PermissionRequests(permissions) => json!({
                "type": "permission-request",
                "permissions": permissions,
            }),
            Reply::TransactionRequests(tx_requests) => json!({
                "type": "get-transaction-requests-response",
                "txRequests": tx_requests,
            }),
            Reply::Keyring { method, value } => json!({
                "type": "keyring",
                "method": method,
                "return": value,
            }),
            Reply::Features(snapshot) => json!({
                "type": "features-response",
                "features": snapshot.features,
                "attributes": snapshot.attributes,
            }),
            Reply::Network(network) => json!({
                "type": "set-network",
                "network": network,
            }),
            Reply::QredoPendingRequest(request) => json!({
                "type": "qredo-connect",
                "method": "getPendingRequestResponse",
                "args": { "request": request },
            }),
            Reply::QredoInfo(info) => json!({
                "type": "qredo-connect",
                "method": "getQredoInfoResponse",
                "args": { "qredoInfo": info },
            }),
            Reply::QredoAccepted(accounts) => json!({
                "type": "qredo-connect",
                "method": "acceptQredoConnectionResponse",
                "args": { "accounts": accounts },
            }),
            Reply::StoredEntities {
                entity_type,
                entities,
            } => json!({
                "type": "method-payload",
                "method": "storedEntitiesResponse",
                "args": { "type": entity_type.as_str(), "entities": entities },
            }),
            Reply::StorageMigrationStatus(status) => json!({
                "type": "method-payload",
                "method": "storageMigrationStatus",
                "args": { "status": status },
            }),
            Reply::Error(err) => json!({
                "error": err.error,
                "code": err.code,
                "message": err.message,
            }),
        }
    }
}

/// Unsolicited notification; always sent without id.
#[derive(Debug, Clone, PartialEq)]
pub enum Push {
    ActiveOrigin(ActiveOrigin),
    EntitiesUpdated(UiEntityType),
}

impl Push {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Push::ActiveOrigin(_) => "update-active-origin",
            Push::EntitiesUpdated(_) => "entitiesUpdated",
        }
    }

    pub fn into_payload(self) -> Value {
        match self {
            Push::ActiveOrigin(ActiveOrigin { origin, fav_icon }) => {
                let mut payload = json!({ "type": "update-active-origin", "origin": origin });
                if let (Some(icon), Some(obj)) = (fav_icon, payload.as_object_mut()) {
                    obj.insert("favIcon".into(), Value::String(icon));
                }
                payload
            }
            Push::EntitiesUpdated(entity_type) => json!({
                "type": "method-payload",
                "method": "entitiesUpdated",
                "args": { "type": entity_type.as_str() },
            }),
        }
    }
}
