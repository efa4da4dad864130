//! Top-level facade crate for uiBridge.
//!
//! Re-exports the protocol core and the gateway library so embedders can depend on a single crate.

pub mod core {
    pub use uibridge_core::*;
}

pub mod gateway {
    pub use uibridge_gateway::*;
}
