//! Dispatch: classification chain, handler registry, and fault boundary.
//!
//! `Dispatcher::dispatch` is the single entry point per inbound envelope.

pub mod chain;
pub mod dispatcher;
pub mod handlers;

pub use chain::{DelegateFamily, Step, CHAIN};
pub use dispatcher::Dispatcher;
pub use handlers::Handlers;
