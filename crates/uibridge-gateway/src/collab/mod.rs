//! External collaborators consumed by the handlers.
//!
//! The router treats every collaborator as a black box exposing async
//! operations. Failures come back as `BridgeError` and are turned into error
//! replies by the dispatcher's fault boundary.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use uibridge_core::error::Result;
use uibridge_core::protocol::request::{
    PermissionResponse, QredoAcceptArgs, TransactionResponse,
};
use uibridge_core::protocol::{Envelope, FeatureSnapshot, MigrationStatus, NetworkEnv};

use crate::connection::Outbound;

/// dApp permission storage and approval flow.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Value>>;
    async fn respond(&self, response: PermissionResponse) -> Result<()>;
    /// Revoke `origin`; when `specific_accounts` is set only those accounts lose access.
    async fn revoke(&self, origin: &str, specific_accounts: Option<Vec<String>>) -> Result<()>;
}

/// Pending transaction approvals.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Value>>;
    async fn respond(&self, response: TransactionResponse) -> Result<()>;
}

/// Key management. `None` means the call produced nothing to return.
#[async_trait]
pub trait Keyring: Send + Sync {
    async fn handle(&self, method: &str, args: Value) -> Result<Option<Value>>;
}

#[async_trait]
pub trait NetworkConfig: Send + Sync {
    async fn active(&self) -> Result<NetworkEnv>;
    async fn set_active(&self, network: NetworkEnv) -> Result<()>;
}

#[async_trait]
pub trait FeatureFlags: Send + Sync {
    /// Force a reload from the flag source.
    async fn refresh(&self) -> Result<()>;
    async fn snapshot(&self) -> Result<FeatureSnapshot>;
}

/// Custodial-connection flow.
#[async_trait]
pub trait QredoConnect: Send + Sync {
    async fn pending_request(&self, request_id: &str) -> Result<Option<Value>>;
    async fn info(&self, qredo_id: &str, refresh_access_token: bool) -> Result<Value>;
    /// Returns the accounts created for the connection.
    async fn accept(&self, args: QredoAcceptArgs) -> Result<Vec<Value>>;
    async fn reject(&self, qredo_id: &str) -> Result<()>;
}

/// Account and account-source persistence, already serialized for the UI.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn accounts(&self) -> Result<Vec<Value>>;
    async fn account_sources(&self) -> Result<Vec<Value>>;
}

#[async_trait]
pub trait StorageMigration: Send + Sync {
    async fn status(&self) -> Result<MigrationStatus>;
    async fn run(&self, password: &str) -> Result<()>;
}

/// Dispatcher owning a whole message family (account sources, accounts).
///
/// Returns `Ok(true)` when it recognized the envelope and sent any reply
/// itself through `outbound`; `Ok(false)` hands the envelope back to the chain.
#[async_trait]
pub trait UiDelegate: Send + Sync {
    fn family(&self) -> &'static str;
    async fn try_handle(&self, env: &Envelope, outbound: &Outbound) -> Result<bool>;
}

/// Every collaborator the handler registry calls into.
#[derive(Clone)]
pub struct Collaborators {
    pub permissions: Arc<dyn PermissionStore>,
    pub transactions: Arc<dyn TransactionStore>,
    pub keyring: Arc<dyn Keyring>,
    pub network: Arc<dyn NetworkConfig>,
    pub features: Arc<dyn FeatureFlags>,
    pub qredo: Arc<dyn QredoConnect>,
    pub entities: Arc<dyn EntityStore>,
    pub migration: Arc<dyn StorageMigration>,
    pub account_sources: Arc<dyn UiDelegate>,
    pub accounts: Arc<dyn UiDelegate>,
}
