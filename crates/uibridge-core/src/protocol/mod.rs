//! Protocol modules.
//!
//! - `envelope`: the `{ id, payload }` JSON frame.
//! - `classify`: ordered shape predicates over raw payloads.
//! - `request`: typed decoding once a predicate matched.
//! - `reply`: correlated replies and id-less pushes.
//! - `types`: values shared with collaborators.
//!
//! Nothing here panics on hostile input: malformed frames and payloads are
//! reported as `BridgeError`.

pub mod classify;
pub mod envelope;
pub mod reply;
pub mod request;
pub mod types;

pub use classify::{classify, unhandled, PayloadKind};
pub use envelope::{CorrelationId, Envelope};
pub use reply::{Push, Reply};
pub use request::Request;
pub use types::{ActiveOrigin, ErrorPayload, FeatureSnapshot, MigrationStatus, NetworkEnv, UiEntityType};
