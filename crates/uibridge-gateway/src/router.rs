//! Axum router wiring (HTTP -> WS upgrade, ops, and background notifications).

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/ui", get(transport::ws::ws_upgrade))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .route("/v1/notify/active-origin", post(ops::notify_active_origin))
        .route("/v1/notify/entities-updated", post(ops::notify_entities_updated))
        .with_state(state)
}
