//! uiBridge gateway library entry.
//!
//! Wires the UI transport, the dispatcher and its collaborators, and the
//! origin notifier into one stack. Consumed by the binary (`main.rs`) and by
//! integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod collab;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod notify;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
