//! uiBridge core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the envelope, the payload classifier, typed requests,
//! and reply builders shared by the gateway and its tests. It carries no
//! transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `BridgeError`/`Result` so a malformed UI message can never take
//! the background process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{BridgeError, FaultKind, Result};
