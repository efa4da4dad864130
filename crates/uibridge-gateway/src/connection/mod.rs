//! UI connection: channel adapter, initialization latch, and push lifecycle.
//!
//! One `UiConnection` exists per UI socket. Outbound envelopes are encoded
//! once and enqueued whole on a bounded queue drained by a single writer, so
//! the dispatch path and the push path can send concurrently without
//! interleaving frames.

mod registry;

pub use registry::ConnectionRegistry;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use uibridge_core::error::{BridgeError, Result};
use uibridge_core::protocol::{CorrelationId, Envelope, Push, Reply, UiEntityType};

use crate::notify::{NotifierState, OriginNotifier, OriginSource};
use crate::obs::metrics::BridgeMetrics;

/// Cloneable send half of a connection's outbound queue.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::Sender<String>,
}

impl Outbound {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Encode and enqueue one envelope.
    pub async fn send(&self, env: &Envelope) -> Result<()> {
        let frame = env.encode()?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Reply correlated with `id`.
    pub async fn reply(&self, id: Option<CorrelationId>, reply: Reply) -> Result<()> {
        self.send(&Envelope::reply(id, reply.into_payload())).await
    }

    /// Push without correlation id.
    pub async fn push(&self, push: Push) -> Result<()> {
        self.send(&Envelope::push(push.into_payload())).await
    }
}

pub struct UiConnection {
    session: String,
    outbound: Outbound,
    initialized: AtomicBool,
    notifier: OriginNotifier,
    origins: Arc<dyn OriginSource>,
    disconnected: watch::Sender<bool>,
    metrics: Arc<BridgeMetrics>,
}

impl UiConnection {
    /// Create a connection and the receive half the transport writer drains.
    pub fn new(
        session: impl Into<String>,
        origins: Arc<dyn OriginSource>,
        metrics: Arc<BridgeMetrics>,
        queue: usize,
    ) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(queue.max(1));
        let (disconnected, _) = watch::channel(false);
        let conn = Arc::new(Self {
            session: session.into(),
            outbound: Outbound::new(tx),
            initialized: AtomicBool::new(false),
            notifier: OriginNotifier::new(),
            origins,
            disconnected,
            metrics,
        });
        (conn, rx)
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    /// Whether the UI has completed its first permission fetch.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Open the latch and start origin forwarding.
    ///
    /// Returns `true` only for the call that flipped the latch; every later
    /// call is a no-op.
    pub fn mark_initialized(&self) -> bool {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.notifier.activate(
            self.origins.as_ref(),
            self.outbound.clone(),
            self.disconnected.subscribe(),
            Arc::clone(&self.metrics),
        );
        true
    }

    pub fn notifier_state(&self) -> NotifierState {
        self.notifier.state()
    }

    /// Tell the UI a stored collection changed and should be refetched.
    ///
    /// At most one send per call; a failed send is logged and not retried.
    pub async fn notify_entities_updated(&self, entity_type: UiEntityType) {
        let push = Push::EntitiesUpdated(entity_type);
        let kind = push.kind();
        match self.outbound.push(push).await {
            Ok(()) => self.metrics.pushes.inc(&[("kind", kind)]),
            Err(e) => tracing::debug!(
                session = %self.session,
                entity_type = entity_type.as_str(),
                error = %e,
                "entities-updated push dropped"
            ),
        }
    }

    /// Disconnect signal from the transport. Idempotent.
    pub fn disconnect(&self) {
        self.disconnected.send_replace(true);
        self.notifier.tear_down();
    }

    pub fn is_disconnected(&self) -> bool {
        *self.disconnected.borrow()
    }
}

impl Drop for UiConnection {
    fn drop(&mut self) {
        self.notifier.tear_down();
    }
}
