//! Handler registry: one async operation per locally handled request.

use tracing::debug;

use uibridge_core::error::Result;
use uibridge_core::protocol::{PayloadKind, Reply, Request, UiEntityType};

use crate::collab::Collaborators;
use crate::connection::UiConnection;

pub struct Handlers {
    collab: Collaborators,
}

impl Handlers {
    pub fn new(collab: Collaborators) -> Self {
        Self { collab }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collab
    }

    /// Run the handler for `req`. `None` means the request is fire-and-forget.
    pub async fn handle(&self, req: Request) -> Result<Option<Reply>> {
        let c = &self.collab;
        let reply = match req {
            Request::GetPermissionRequests => Reply::PermissionRequests(c.permissions.list().await?),
            Request::PermissionResponse(response) => {
                c.permissions.respond(response).await?;
                return Ok(None);
            }
            Request::TransactionRequestResponse(response) => {
                c.transactions.respond(response).await?;
                return Ok(None);
            }
            Request::GetTransactionRequests => {
                Reply::TransactionRequests(c.transactions.list().await?)
            }
            Request::DisconnectApp(req) => {
                c.permissions
                    .revoke(&req.origin, req.specific_accounts)
                    .await?;
                Reply::Done
            }
            Request::Keyring(call) => match c.keyring.handle(&call.method, call.args).await? {
                Some(value) => Reply::Keyring {
                    method: call.method,
                    value,
                },
                None => Reply::Done,
            },
            Request::GetFeatures => {
                c.features.refresh().await?;
                Reply::Features(c.features.snapshot().await?)
            }
            Request::GetNetwork => Reply::Network(c.network.active().await?),
            Request::SetNetwork(network) => {
                c.network.set_active(network).await?;
                Reply::Done
            }
            Request::QredoGetPendingRequest(args) => {
                Reply::QredoPendingRequest(c.qredo.pending_request(&args.request_id).await?)
            }
            Request::QredoGetInfo(args) => Reply::QredoInfo(
                c.qredo
                    .info(&args.qredo_id, args.refresh_access_token)
                    .await?,
            ),
            Request::QredoAccept(args) => Reply::QredoAccepted(c.qredo.accept(args).await?),
            Request::QredoReject(args) => {
                c.qredo.reject(&args.qredo_id).await?;
                Reply::Done
            }
            Request::GetStoredEntities(args) => {
                let entity_type = UiEntityType::parse(&args.entity_type)?;
                let entities = match entity_type {
                    UiEntityType::Accounts => c.entities.accounts().await?,
                    UiEntityType::AccountSources => c.entities.account_sources().await?,
                };
                Reply::StoredEntities {
                    entity_type,
                    entities,
                }
            }
            Request::GetStorageMigrationStatus => {
                Reply::StorageMigrationStatus(c.migration.status().await?)
            }
            Request::DoStorageMigration(args) => {
                c.migration.run(&args.password).await?;
                Reply::Done
            }
        };
        Ok(Some(reply))
    }

    /// Connection side effects that must follow a successful reply.
    ///
    /// The first permission fetch opens the latch here, so the permission
    /// list is queued ahead of any active-origin push.
    pub fn after_reply(&self, conn: &UiConnection, kind: PayloadKind) {
        if kind == PayloadKind::GetPermissionRequests && conn.mark_initialized() {
            debug!(session = %conn.session(), "ui initialized");
        }
    }
}
