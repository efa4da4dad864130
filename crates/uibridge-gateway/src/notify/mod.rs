//! Push notifications towards the UI.
//!
//! `origin` hosts the latch-gated active-origin notifier and the in-process
//! origin feed. The entities-updated helper lives on `UiConnection`.

pub mod origin;

pub use origin::{NotifierState, OriginFeed, OriginNotifier, OriginSource};
