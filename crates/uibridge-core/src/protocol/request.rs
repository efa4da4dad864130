//! Typed requests decoded after classification.
//!
//! Decoding happens only once a predicate matched, so a malformed payload of a
//! known kind is reported as invalid rather than unhandled.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::protocol::classify::PayloadKind;
use crate::protocol::types::NetworkEnv;

/// User decision on a pending dApp permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub id: String,
    pub accounts: Vec<String>,
    pub allowed: bool,
    pub response_date: String,
}

/// User decision on a pending transaction approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_result_error: Option<String>,
}

/// Revoke an origin's permission, optionally for some accounts only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectApp {
    pub origin: String,
    #[serde(default)]
    pub specific_accounts: Option<Vec<String>>,
}

/// Key-management call forwarded to the keyring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyringCall {
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetNetwork {
    pub network: NetworkEnv,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QredoPendingRequestArgs {
    #[serde(rename = "requestID")]
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QredoInfoArgs {
    #[serde(rename = "qredoID")]
    pub qredo_id: String,
    #[serde(default)]
    pub refresh_access_token: bool,
}

/// Accept a custodial connection and import the selected accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QredoAcceptArgs {
    #[serde(rename = "qredoID")]
    pub qredo_id: String,
    pub password: String,
    pub accounts: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QredoRejectArgs {
    #[serde(rename = "qredoID")]
    pub qredo_id: String,
}

/// Raw tag; validated by the handler so unknown tags fail as unknown entity types.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredEntitiesArgs {
    #[serde(rename = "type")]
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageMigrationArgs {
    pub password: String,
}

#[derive(Deserialize)]
struct WithArgs<T> {
    args: T,
}

/// A classified and decoded inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    GetPermissionRequests,
    PermissionResponse(PermissionResponse),
    TransactionRequestResponse(TransactionResponse),
    GetTransactionRequests,
    DisconnectApp(DisconnectApp),
    Keyring(KeyringCall),
    GetFeatures,
    GetNetwork,
    SetNetwork(NetworkEnv),
    QredoGetPendingRequest(QredoPendingRequestArgs),
    QredoGetInfo(QredoInfoArgs),
    QredoAccept(QredoAcceptArgs),
    QredoReject(QredoRejectArgs),
    GetStoredEntities(StoredEntitiesArgs),
    GetStorageMigrationStatus,
    DoStorageMigration(StorageMigrationArgs),
}

impl Request {
    /// Decode `payload` as the variant selected by the classifier.
    pub fn decode(kind: PayloadKind, payload: Value) -> Result<Self> {
        let req = match kind {
            PayloadKind::GetPermissionRequests => Request::GetPermissionRequests,
            PayloadKind::PermissionResponse => Request::PermissionResponse(fields(kind, payload)?),
            PayloadKind::TransactionRequestResponse => {
                Request::TransactionRequestResponse(fields(kind, payload)?)
            }
            PayloadKind::GetTransactionRequests => Request::GetTransactionRequests,
            PayloadKind::DisconnectApp => Request::DisconnectApp(fields(kind, payload)?),
            PayloadKind::Keyring => Request::Keyring(fields(kind, payload)?),
            PayloadKind::GetFeatures => Request::GetFeatures,
            PayloadKind::GetNetwork => Request::GetNetwork,
            PayloadKind::SetNetwork => {
                let body: SetNetwork = fields(kind, payload)?;
                Request::SetNetwork(body.network)
            }
            PayloadKind::QredoGetPendingRequest => {
                Request::QredoGetPendingRequest(args(kind, payload)?)
            }
            PayloadKind::QredoGetInfo => Request::QredoGetInfo(args(kind, payload)?),
            PayloadKind::QredoAccept => Request::QredoAccept(args(kind, payload)?),
            PayloadKind::QredoReject => Request::QredoReject(args(kind, payload)?),
            PayloadKind::GetStoredEntities => Request::GetStoredEntities(args(kind, payload)?),
            PayloadKind::GetStorageMigrationStatus => Request::GetStorageMigrationStatus,
            PayloadKind::DoStorageMigration => Request::DoStorageMigration(args(kind, payload)?),
        };
        Ok(req)
    }
}

fn fields<T: DeserializeOwned>(kind: PayloadKind, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| BridgeError::InvalidPayload {
        kind: kind.as_str(),
        reason: e.to_string(),
    })
}

fn args<T: DeserializeOwned>(kind: PayloadKind, payload: Value) -> Result<T> {
    fields::<WithArgs<T>>(kind, payload).map(|w| w.args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disconnect_app_accounts_are_optional() {
        let req = Request::decode(
            PayloadKind::DisconnectApp,
            json!({"type": "disconnect-app", "origin": "https://x"}),
        )
        .ok();
        assert_eq!(
            req,
            Some(Request::DisconnectApp(DisconnectApp {
                origin: "https://x".into(),
                specific_accounts: None,
            }))
        );
    }

    #[test]
    fn missing_args_is_invalid_payload() {
        let err = Request::decode(
            PayloadKind::DoStorageMigration,
            json!({"type": "method-payload", "method": "doStorageMigration"}),
        )
        .err();
        let msg = err.map(|e| e.to_string()).unwrap_or_default();
        assert!(msg.starts_with("invalid method-payload:doStorageMigration payload"), "{msg}");
    }
}
