#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use uibridge_core::protocol::Envelope;
use uibridge_gateway::collab::memory::MemoryBackend;
use uibridge_gateway::collab::Collaborators;
use uibridge_gateway::connection::UiConnection;
use uibridge_gateway::dispatch::Dispatcher;
use uibridge_gateway::notify::OriginFeed;
use uibridge_gateway::obs::metrics::BridgeMetrics;

pub const PASSWORD: &str = "hunter2";

pub struct Harness {
    pub dispatcher: Dispatcher,
    pub backend: MemoryBackend,
    pub feed: Arc<OriginFeed>,
    pub metrics: Arc<BridgeMetrics>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ack(false)
    }

    pub fn with_ack(ack: bool) -> Self {
        Self::build(ack, |_| {})
    }

    /// Memory backend with some collaborators swapped out.
    pub fn with_collaborators(swap: impl FnOnce(&mut Collaborators)) -> Self {
        Self::build(false, swap)
    }

    fn build(ack: bool, swap: impl FnOnce(&mut Collaborators)) -> Self {
        let backend = MemoryBackend::new("mainnet", PASSWORD);
        let metrics = Arc::new(BridgeMetrics::default());
        let mut collab = backend.collaborators();
        swap(&mut collab);
        let dispatcher =
            Dispatcher::new(collab, Arc::clone(&metrics)).with_fire_and_forget_ack(ack);
        Self {
            dispatcher,
            backend,
            feed: Arc::new(OriginFeed::new(16)),
            metrics,
        }
    }

    pub fn connect(&self, session: &str) -> (Arc<UiConnection>, mpsc::Receiver<String>) {
        UiConnection::new(session, self.feed.clone(), Arc::clone(&self.metrics), 32)
    }

    pub async fn send(&self, conn: &UiConnection, frame: &str) {
        let env = Envelope::decode(frame).expect("test frame must decode");
        self.dispatcher.dispatch(conn, env).await;
    }
}

/// Next outbound frame, parsed.
pub async fn next_frame(rx: &mut mpsc::Receiver<String>) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("frame within 1s")
        .expect("queue open");
    serde_json::from_str(&frame).expect("frame is json")
}

/// Assert nothing is queued, giving spawned forwarders a moment to run.
pub async fn assert_quiet(rx: &mut mpsc::Receiver<String>) {
    let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(got.is_err(), "unexpected frame: {got:?}");
}
