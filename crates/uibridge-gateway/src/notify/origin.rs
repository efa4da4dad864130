use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use uibridge_core::protocol::{ActiveOrigin, Push};

use crate::connection::Outbound;
use crate::obs::metrics::BridgeMetrics;

/// Source of "active browsing context changed" events.
///
/// A receiver only observes events sent after `subscribe` returns.
pub trait OriginSource: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<ActiveOrigin>;
}

/// In-process origin tracker feed.
pub struct OriginFeed {
    tx: broadcast::Sender<ActiveOrigin>,
}

impl OriginFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns the number of live subscribers (0 is not an error).
    pub fn publish(&self, origin: ActiveOrigin) -> usize {
        self.tx.send(origin).unwrap_or(0)
    }
}

impl OriginSource for OriginFeed {
    fn subscribe(&self) -> broadcast::Receiver<ActiveOrigin> {
        self.tx.subscribe()
    }
}

/// Observable notifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    Dormant,
    Active,
    TornDown,
}

enum Phase {
    Dormant,
    Active(JoinHandle<()>),
    TornDown,
}

/// Latch-gated forwarding of active-origin events to one UI connection.
///
/// Dormant -> Active happens at most once. TornDown is terminal and reachable
/// from either state.
pub struct OriginNotifier {
    phase: Mutex<Phase>,
}

impl Default for OriginNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginNotifier {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Dormant),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> NotifierState {
        match *self.lock() {
            Phase::Dormant => NotifierState::Dormant,
            Phase::Active(_) => NotifierState::Active,
            Phase::TornDown => NotifierState::TornDown,
        }
    }

    /// Subscribe to `source` and start forwarding. No-op unless Dormant.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(
        &self,
        source: &dyn OriginSource,
        outbound: Outbound,
        disconnected: watch::Receiver<bool>,
        metrics: Arc<BridgeMetrics>,
    ) -> bool {
        let mut phase = self.lock();
        if !matches!(*phase, Phase::Dormant) {
            return false;
        }
        // Subscribing here, not earlier, is what drops events from the Dormant period.
        let events = source.subscribe();
        let handle = tokio::spawn(forward(events, outbound, disconnected, metrics));
        *phase = Phase::Active(handle);
        debug!("origin notifier active");
        true
    }

    /// Stop forwarding for good.
    pub fn tear_down(&self) {
        let prev = std::mem::replace(&mut *self.lock(), Phase::TornDown);
        if let Phase::Active(handle) = prev {
            handle.abort();
            debug!("origin notifier torn down");
        }
    }
}

async fn forward(
    mut events: broadcast::Receiver<ActiveOrigin>,
    outbound: Outbound,
    mut disconnected: watch::Receiver<bool>,
    metrics: Arc<BridgeMetrics>,
) {
    loop {
        tokio::select! {
            biased;

            _ = async { let _ = disconnected.wait_for(|d| *d).await; } => break,

            ev = events.recv() => match ev {
                Ok(origin) => {
                    if *disconnected.borrow() {
                        break;
                    }
                    let push = Push::ActiveOrigin(origin);
                    let kind = push.kind();
                    if let Err(e) = outbound.push(push).await {
                        // Push-path failure: no request to answer, log only.
                        warn!(error = %e, "active origin push failed");
                        break;
                    }
                    metrics.pushes.inc(&[("kind", kind)]);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "origin events lagged; oldest dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    debug!("origin forwarding stopped");
}
