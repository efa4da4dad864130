use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tracing::{debug, warn};

use uibridge_core::error::{BridgeError, Result};
use uibridge_core::protocol::{unhandled, CorrelationId, Envelope, Reply, Request};

use crate::collab::{Collaborators, UiDelegate};
use crate::connection::UiConnection;
use crate::dispatch::chain::{DelegateFamily, Step, CHAIN};
use crate::dispatch::handlers::Handlers;
use crate::obs::metrics::BridgeMetrics;

/// Routes inbound envelopes through the classification chain.
pub struct Dispatcher {
    handlers: Handlers,
    metrics: Arc<BridgeMetrics>,
    ack_fire_and_forget: bool,
}

impl Dispatcher {
    pub fn new(collab: Collaborators, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            handlers: Handlers::new(collab),
            metrics,
            ack_fire_and_forget: false,
        }
    }

    /// Reply `{type:"done"}` to fire-and-forget requests as well.
    pub fn with_fire_and_forget_ack(mut self, enabled: bool) -> Self {
        self.ack_fire_and_forget = enabled;
        self
    }

    /// Dispatch one envelope inside the fault boundary.
    ///
    /// Never fails: any fault raised while classifying or handling becomes an
    /// error reply carrying the envelope's id. A panicking handler or
    /// collaborator is reported as an internal fault.
    pub async fn dispatch(&self, conn: &UiConnection, env: Envelope) {
        let started = Instant::now();
        let id = env.id.clone();

        let outcome = AssertUnwindSafe(self.route(conn, env))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(BridgeError::Internal(panic_message(panic.as_ref()))));

        match outcome {
            Ok(route) => {
                self.metrics.messages.inc(&[("route", route)]);
                self.metrics
                    .dispatch_duration
                    .observe(&[("route", route)], started.elapsed());
            }
            Err(e) => {
                let fault = e.fault_kind().as_str();
                warn!(
                    session = %conn.session(),
                    id = id.as_deref().unwrap_or("undefined"),
                    fault,
                    error = %e,
                    "dispatch fault"
                );
                self.metrics.faults.inc(&[("fault", fault)]);
                self.deliver(conn, id, Reply::error(e.to_string()), "error")
                    .await;
            }
        }
    }

    /// Walk the chain; first matching step wins.
    async fn route(&self, conn: &UiConnection, env: Envelope) -> Result<&'static str> {
        for step in CHAIN {
            match step {
                Step::Local(kind) => {
                    if !kind.matches(&env.payload) {
                        continue;
                    }
                    let route = kind.as_str();
                    let req = Request::decode(kind, env.payload)?;
                    match self.handlers.handle(req).await? {
                        Some(reply) => self.deliver(conn, env.id, reply, route).await,
                        None if self.ack_fire_and_forget => {
                            self.deliver(conn, env.id, Reply::Done, route).await
                        }
                        None => {}
                    }
                    self.handlers.after_reply(conn, kind);
                    return Ok(route);
                }
                Step::Delegate(family) => {
                    let delegate = self.delegate(family);
                    if delegate.try_handle(&env, conn.outbound()).await? {
                        debug!(
                            session = %conn.session(),
                            delegate = delegate.family(),
                            "claimed by delegate"
                        );
                        return Ok(family.as_str());
                    }
                }
            }
        }
        Err(unhandled(&env))
    }

    fn delegate(&self, family: DelegateFamily) -> &dyn UiDelegate {
        let c = self.handlers.collaborators();
        match family {
            DelegateFamily::AccountSources => c.account_sources.as_ref(),
            DelegateFamily::Accounts => c.accounts.as_ref(),
        }
    }

    /// Send a reply; a closed channel turns it into a logged drop.
    async fn deliver(
        &self,
        conn: &UiConnection,
        id: Option<CorrelationId>,
        reply: Reply,
        route: &'static str,
    ) {
        if let Err(e) = conn.outbound().reply(id, reply).await {
            self.metrics.dropped_replies.inc(&[("route", route)]);
            debug!(session = %conn.session(), route, error = %e, "reply dropped");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("handler panicked: {detail}")
}
