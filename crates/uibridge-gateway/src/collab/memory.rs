//! In-memory collaborators.
//!
//! Used by the binary when no platform storage is wired in, and by the
//! integration tests. Each one keeps just enough state to honour its trait
//! contract, including the failure cases the router must contain.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::{Mutex, RwLock};

use uibridge_core::error::{BridgeError, Result};
use uibridge_core::protocol::request::{
    PermissionResponse, QredoAcceptArgs, TransactionResponse,
};
use uibridge_core::protocol::{
    Envelope, FeatureSnapshot, MigrationStatus, NetworkEnv, Push, Reply, UiEntityType,
};

use super::{
    Collaborators, EntityStore, FeatureFlags, Keyring, NetworkConfig, PermissionStore,
    QredoConnect, StorageMigration, TransactionStore, UiDelegate,
};
use crate::connection::Outbound;

fn str_field<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

// --------------------
// Permissions
// --------------------

/// Permissions keyed by request id.
#[derive(Default)]
pub struct MemoryPermissions {
    records: DashMap<String, Value>,
}

impl MemoryPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pending permission request for `origin`.
    pub fn insert_pending(&self, id: &str, origin: &str) {
        self.records.insert(
            id.to_string(),
            json!({
                "id": id,
                "origin": origin,
                "accounts": [],
                "allowed": null,
                "responseDate": null,
            }),
        );
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.records.get(id).map(|r| r.value().clone())
    }

    pub fn has_origin(&self, origin: &str) -> bool {
        self.records
            .iter()
            .any(|r| str_field(r.value(), "origin") == Some(origin))
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissions {
    async fn list(&self) -> Result<Vec<Value>> {
        let mut all: Vec<Value> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| str_field(a, "id").cmp(&str_field(b, "id")));
        Ok(all)
    }

    async fn respond(&self, response: PermissionResponse) -> Result<()> {
        let mut record = self.records.get_mut(&response.id).ok_or_else(|| {
            BridgeError::collaborator(format!("Permission request {} not found", response.id))
        })?;
        if let Some(obj) = record.as_object_mut() {
            obj.insert("accounts".into(), json!(response.accounts));
            obj.insert("allowed".into(), json!(response.allowed));
            obj.insert("responseDate".into(), json!(response.response_date));
        }
        Ok(())
    }

    async fn revoke(&self, origin: &str, specific_accounts: Option<Vec<String>>) -> Result<()> {
        let only = specific_accounts.filter(|a| !a.is_empty());
        let ids: Vec<String> = self
            .records
            .iter()
            .filter(|r| str_field(r.value(), "origin") == Some(origin))
            .map(|r| r.key().clone())
            .collect();

        for id in ids {
            let Some(only) = &only else {
                self.records.remove(&id);
                continue;
            };
            let now_empty = match self.records.get_mut(&id) {
                Some(mut record) => {
                    let remaining: Vec<Value> = record
                        .get("accounts")
                        .and_then(Value::as_array)
                        .map(|accounts| {
                            accounts
                                .iter()
                                .filter(|a| a.as_str().map_or(true, |a| !only.iter().any(|o| o == a)))
                                .cloned()
                                .collect()
                        })
                        .unwrap_or_default();
                    let empty = remaining.is_empty();
                    if let Some(obj) = record.as_object_mut() {
                        obj.insert("accounts".into(), Value::Array(remaining));
                    }
                    empty
                }
                None => false,
            };
            if now_empty {
                self.records.remove(&id);
            }
        }
        Ok(())
    }
}

// --------------------
// Transactions
// --------------------

#[derive(Default)]
pub struct MemoryTransactions {
    requests: DashMap<String, Value>,
    decisions: DashMap<String, bool>,
}

impl MemoryTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_pending(&self, tx_id: &str, origin: &str) {
        self.requests.insert(
            tx_id.to_string(),
            json!({ "id": tx_id, "origin": origin, "approved": null }),
        );
    }

    /// Decision recorded for `tx_id`, if any.
    pub fn decision(&self, tx_id: &str) -> Option<bool> {
        self.decisions.get(tx_id).map(|d| *d)
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactions {
    async fn list(&self) -> Result<Vec<Value>> {
        let mut all: Vec<Value> = self.requests.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| str_field(a, "id").cmp(&str_field(b, "id")));
        Ok(all)
    }

    async fn respond(&self, response: TransactionResponse) -> Result<()> {
        self.requests.remove(&response.tx_id).ok_or_else(|| {
            BridgeError::collaborator(format!("Transaction request {} not found", response.tx_id))
        })?;
        self.decisions.insert(response.tx_id, response.approved);
        Ok(())
    }
}

// --------------------
// Keyring
// --------------------

/// Password-locked keyring supporting `isLocked`, `lock`, and `unlock`.
pub struct MemoryKeyring {
    password: String,
    locked: AtomicBool,
}

impl MemoryKeyring {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            locked: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl Keyring for MemoryKeyring {
    async fn handle(&self, method: &str, args: Value) -> Result<Option<Value>> {
        match method {
            "isLocked" => Ok(Some(json!(self.locked.load(Ordering::Acquire)))),
            "lock" => {
                self.locked.store(true, Ordering::Release);
                Ok(None)
            }
            "unlock" => {
                if str_field(&args, "password") != Some(self.password.as_str()) {
                    return Err(BridgeError::collaborator("Wrong password"));
                }
                self.locked.store(false, Ordering::Release);
                Ok(None)
            }
            other => Err(BridgeError::collaborator(format!(
                "Unknown keyring method {other}"
            ))),
        }
    }
}

// --------------------
// Network
// --------------------

pub struct MemoryNetwork {
    active: RwLock<NetworkEnv>,
}

impl MemoryNetwork {
    pub fn new(env: impl Into<String>) -> Self {
        Self {
            active: RwLock::new(NetworkEnv {
                env: env.into(),
                custom_rpc_url: None,
            }),
        }
    }
}

#[async_trait]
impl NetworkConfig for MemoryNetwork {
    async fn active(&self) -> Result<NetworkEnv> {
        Ok(self.active.read().await.clone())
    }

    async fn set_active(&self, network: NetworkEnv) -> Result<()> {
        if network.env == "customRpc" && network.custom_rpc_url.is_none() {
            return Err(BridgeError::collaborator("Custom RPC url is required"));
        }
        *self.active.write().await = network;
        Ok(())
    }
}

// --------------------
// Feature flags
// --------------------

/// Fixed flag set; `refresh` only counts reloads.
pub struct StaticFeatures {
    snapshot: FeatureSnapshot,
    refreshes: AtomicU64,
}

impl StaticFeatures {
    pub fn new(snapshot: FeatureSnapshot) -> Self {
        Self {
            snapshot,
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FeatureFlags for StaticFeatures {
    async fn refresh(&self) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn snapshot(&self) -> Result<FeatureSnapshot> {
        Ok(self.snapshot.clone())
    }
}

// --------------------
// Qredo connect
// --------------------

/// Pending custodial-connection requests keyed by request id.
#[derive(Default)]
pub struct MemoryQredo {
    pending: DashMap<String, Value>,
}

impl MemoryQredo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_pending(&self, request_id: &str, qredo_id: &str, origin: &str) {
        self.pending.insert(
            request_id.to_string(),
            json!({
                "requestID": request_id,
                "qredoID": qredo_id,
                "origin": origin,
                "service": "qredo",
            }),
        );
    }

    fn remove_by_qredo_id(&self, qredo_id: &str) -> Option<Value> {
        let key = self
            .pending
            .iter()
            .find(|r| str_field(r.value(), "qredoID") == Some(qredo_id))
            .map(|r| r.key().clone())?;
        self.pending.remove(&key).map(|(_, v)| v)
    }

    fn not_found(qredo_id: &str) -> BridgeError {
        BridgeError::collaborator(format!("Qredo connection {qredo_id} not found"))
    }
}

#[async_trait]
impl QredoConnect for MemoryQredo {
    async fn pending_request(&self, request_id: &str) -> Result<Option<Value>> {
        Ok(self.pending.get(request_id).map(|r| r.value().clone()))
    }

    async fn info(&self, qredo_id: &str, refresh_access_token: bool) -> Result<Value> {
        let request = self
            .pending
            .iter()
            .find(|r| str_field(r.value(), "qredoID") == Some(qredo_id))
            .map(|r| r.value().clone())
            .ok_or_else(|| Self::not_found(qredo_id))?;
        Ok(json!({
            "qredoID": qredo_id,
            "service": request.get("service").cloned().unwrap_or(Value::Null),
            "accessTokenRefreshed": refresh_access_token,
        }))
    }

    async fn accept(&self, args: QredoAcceptArgs) -> Result<Vec<Value>> {
        if args.password.is_empty() {
            return Err(BridgeError::collaborator("Wrong password"));
        }
        self.remove_by_qredo_id(&args.qredo_id)
            .ok_or_else(|| Self::not_found(&args.qredo_id))?;
        Ok(args
            .accounts
            .into_iter()
            .map(|mut account| {
                if let Some(obj) = account.as_object_mut() {
                    obj.insert("qredoID".into(), Value::String(args.qredo_id.clone()));
                }
                account
            })
            .collect())
    }

    async fn reject(&self, qredo_id: &str) -> Result<()> {
        self.remove_by_qredo_id(qredo_id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(qredo_id))
    }
}

// --------------------
// Accounts / account sources
// --------------------

/// UI-serialized accounts and account sources.
#[derive(Default)]
pub struct MemoryEntities {
    accounts: RwLock<Vec<Value>>,
    account_sources: RwLock<Vec<Value>>,
}

impl MemoryEntities {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_account(&self, account: Value) {
        self.accounts.write().await.push(account);
    }

    pub async fn add_account_source(&self, source: Value) {
        self.account_sources.write().await.push(source);
    }

    async fn update(
        list: &RwLock<Vec<Value>>,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<()> {
        let mut list = list.write().await;
        let record = list
            .iter_mut()
            .find(|r| str_field(r, "id") == Some(id))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| BridgeError::collaborator(format!("Entity {id} not found")))?;
        record.insert(field.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl EntityStore for MemoryEntities {
    async fn accounts(&self) -> Result<Vec<Value>> {
        Ok(self.accounts.read().await.clone())
    }

    async fn account_sources(&self) -> Result<Vec<Value>> {
        Ok(self.account_sources.read().await.clone())
    }
}

#[derive(Deserialize)]
struct MethodCall {
    #[serde(rename = "type")]
    ty: String,
    method: String,
    #[serde(default)]
    args: Map<String, Value>,
}

impl MethodCall {
    /// `method-payload` call named `method`, if `env` carries one.
    fn matching(env: &Envelope, method: &str) -> Option<Self> {
        let call: MethodCall = serde_json::from_value(env.payload.clone()).ok()?;
        (call.ty == "method-payload" && call.method == method).then_some(call)
    }

    fn id_arg(&self) -> Result<&str> {
        self.args
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::collaborator(format!("{}: missing id", self.method)))
    }
}

/// Account-source family: `lockAccountSourceOrAccount`.
pub struct AccountSourcesDelegate {
    entities: Arc<MemoryEntities>,
}

impl AccountSourcesDelegate {
    pub fn new(entities: Arc<MemoryEntities>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl UiDelegate for AccountSourcesDelegate {
    fn family(&self) -> &'static str {
        "account-sources"
    }

    async fn try_handle(&self, env: &Envelope, outbound: &Outbound) -> Result<bool> {
        let Some(call) = MethodCall::matching(env, "lockAccountSourceOrAccount") else {
            return Ok(false);
        };
        let id = call.id_arg()?;
        MemoryEntities::update(&self.entities.account_sources, id, "isLocked", json!(true))
            .await?;
        outbound.reply(env.id.clone(), Reply::Done).await?;
        outbound
            .push(Push::EntitiesUpdated(UiEntityType::AccountSources))
            .await?;
        Ok(true)
    }
}

/// Account family: `setAccountNickname`.
pub struct AccountsDelegate {
    entities: Arc<MemoryEntities>,
}

impl AccountsDelegate {
    pub fn new(entities: Arc<MemoryEntities>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl UiDelegate for AccountsDelegate {
    fn family(&self) -> &'static str {
        "accounts"
    }

    async fn try_handle(&self, env: &Envelope, outbound: &Outbound) -> Result<bool> {
        let Some(call) = MethodCall::matching(env, "setAccountNickname") else {
            return Ok(false);
        };
        let id = call.id_arg()?;
        let nickname = call.args.get("nickname").cloned().unwrap_or(Value::Null);
        MemoryEntities::update(&self.entities.accounts, id, "nickname", nickname).await?;
        outbound.reply(env.id.clone(), Reply::Done).await?;
        outbound
            .push(Push::EntitiesUpdated(UiEntityType::Accounts))
            .await?;
        Ok(true)
    }
}

// --------------------
// Storage migration
// --------------------

pub struct MemoryMigration {
    password: String,
    status: Mutex<MigrationStatus>,
}

impl MemoryMigration {
    pub fn new(password: impl Into<String>, status: MigrationStatus) -> Self {
        Self {
            password: password.into(),
            status: Mutex::new(status),
        }
    }
}

#[async_trait]
impl StorageMigration for MemoryMigration {
    async fn status(&self) -> Result<MigrationStatus> {
        Ok(*self.status.lock().await)
    }

    async fn run(&self, password: &str) -> Result<()> {
        let mut status = self.status.lock().await;
        match *status {
            MigrationStatus::Ready => return Ok(()),
            MigrationStatus::InProgress => {
                return Err(BridgeError::collaborator("Storage migration already in progress"))
            }
            MigrationStatus::Required => {}
        }
        if password != self.password {
            return Err(BridgeError::collaborator("Wrong password"));
        }
        *status = MigrationStatus::Ready;
        Ok(())
    }
}

// --------------------
// Bundle
// --------------------

/// Typed handles on the in-memory collaborators, for seeding and inspection.
#[derive(Clone)]
pub struct MemoryBackend {
    pub permissions: Arc<MemoryPermissions>,
    pub transactions: Arc<MemoryTransactions>,
    pub keyring: Arc<MemoryKeyring>,
    pub network: Arc<MemoryNetwork>,
    pub features: Arc<StaticFeatures>,
    pub qredo: Arc<MemoryQredo>,
    pub entities: Arc<MemoryEntities>,
    pub migration: Arc<MemoryMigration>,
}

impl MemoryBackend {
    /// Empty stores; `password` unlocks the keyring and the storage migration.
    pub fn new(default_network: &str, password: &str) -> Self {
        Self {
            permissions: Arc::new(MemoryPermissions::new()),
            transactions: Arc::new(MemoryTransactions::new()),
            keyring: Arc::new(MemoryKeyring::new(password)),
            network: Arc::new(MemoryNetwork::new(default_network)),
            features: Arc::new(StaticFeatures::new(FeatureSnapshot {
                features: json!({}),
                attributes: json!({ "network": default_network }),
            })),
            qredo: Arc::new(MemoryQredo::new()),
            entities: Arc::new(MemoryEntities::new()),
            migration: Arc::new(MemoryMigration::new(password, MigrationStatus::Required)),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            permissions: self.permissions.clone(),
            transactions: self.transactions.clone(),
            keyring: self.keyring.clone(),
            network: self.network.clone(),
            features: self.features.clone(),
            qredo: self.qredo.clone(),
            entities: self.entities.clone(),
            migration: self.migration.clone(),
            account_sources: Arc::new(AccountSourcesDelegate::new(self.entities.clone())),
            accounts: Arc::new(AccountsDelegate::new(self.entities.clone())),
        }
    }
}
