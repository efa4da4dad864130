//! Shared application state for the uiBridge gateway.

use std::sync::Arc;

use uibridge_core::error::Result;
use uibridge_core::protocol::{ActiveOrigin, UiEntityType};

use crate::collab::{memory::MemoryBackend, Collaborators};
use crate::config::BridgeConfig;
use crate::connection::ConnectionRegistry;
use crate::dispatch::Dispatcher;
use crate::notify::{OriginFeed, OriginSource};
use crate::obs::metrics::BridgeMetrics;

const ORIGIN_FEED_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: BridgeConfig,
    dispatcher: Arc<Dispatcher>,
    connections: Arc<ConnectionRegistry>,
    origins: Arc<OriginFeed>,
    metrics: Arc<BridgeMetrics>,
}

impl AppState {
    /// Build state over the given collaborators.
    /// Returns Result so main can report a bad config instead of panicking.
    pub fn new(cfg: BridgeConfig, collab: Collaborators) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(BridgeMetrics::default());
        let dispatcher = Dispatcher::new(collab, Arc::clone(&metrics))
            .with_fire_and_forget_ack(cfg.dispatch.ack_fire_and_forget);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                dispatcher: Arc::new(dispatcher),
                connections: Arc::new(ConnectionRegistry::new()),
                origins: Arc::new(OriginFeed::new(ORIGIN_FEED_CAPACITY)),
                metrics,
            }),
        })
    }

    /// Build state over in-memory collaborators seeded from `cfg.backend`.
    pub fn with_memory_backend(cfg: BridgeConfig) -> Result<(Self, MemoryBackend)> {
        let backend = MemoryBackend::new(&cfg.backend.default_network, &cfg.backend.password);
        let state = Self::new(cfg, backend.collaborators())?;
        Ok((state, backend))
    }

    pub fn cfg(&self) -> &BridgeConfig {
        &self.inner.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.inner.connections
    }

    pub fn origin_source(&self) -> Arc<dyn OriginSource> {
        self.inner.origins.clone()
    }

    pub fn metrics(&self) -> Arc<BridgeMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    /// Publish an active-origin change; returns how many notifiers received it.
    pub fn publish_active_origin(&self, origin: ActiveOrigin) -> usize {
        self.inner.origins.publish(origin)
    }

    /// Push `entitiesUpdated` to every open UI connection.
    pub async fn notify_entities_updated(&self, entity_type: UiEntityType) -> usize {
        self.inner.connections.notify_entities_updated(entity_type).await
    }
}
