//! Ordered classification chain.
//!
//! Local steps and delegate steps interleave: the narrow `getStoredEntities`
//! check must run before the account delegates, which claim other
//! `method-payload` shapes, and the storage-migration methods only get a
//! chance once both delegates declined.

use uibridge_core::protocol::PayloadKind;

/// Families owned by external dispatchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateFamily {
    AccountSources,
    Accounts,
}

impl DelegateFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            DelegateFamily::AccountSources => "account-sources",
            DelegateFamily::Accounts => "accounts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Handled here when the kind's predicate matches.
    Local(PayloadKind),
    /// Offered to a delegate, which may decline.
    Delegate(DelegateFamily),
}

pub const CHAIN: [Step; 18] = [
    Step::Local(PayloadKind::GetPermissionRequests),
    Step::Local(PayloadKind::PermissionResponse),
    Step::Local(PayloadKind::TransactionRequestResponse),
    Step::Local(PayloadKind::GetTransactionRequests),
    Step::Local(PayloadKind::DisconnectApp),
    Step::Local(PayloadKind::Keyring),
    Step::Local(PayloadKind::GetFeatures),
    Step::Local(PayloadKind::GetNetwork),
    Step::Local(PayloadKind::SetNetwork),
    Step::Local(PayloadKind::QredoGetPendingRequest),
    Step::Local(PayloadKind::QredoGetInfo),
    Step::Local(PayloadKind::QredoAccept),
    Step::Local(PayloadKind::QredoReject),
    Step::Local(PayloadKind::GetStoredEntities),
    Step::Delegate(DelegateFamily::AccountSources),
    Step::Delegate(DelegateFamily::Accounts),
    Step::Local(PayloadKind::GetStorageMigrationStatus),
    Step::Local(PayloadKind::DoStorageMigration),
];
