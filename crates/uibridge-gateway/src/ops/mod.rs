//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format
//! - `/v1/notify/*` : background-side events fanned out to UI connections

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use uibridge_core::protocol::{ActiveOrigin, UiEntityType};

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn notify_active_origin(
    State(state): State<AppState>,
    Json(origin): Json<ActiveOrigin>,
) -> Response {
    let delivered = state.publish_active_origin(origin);
    debug!(delivered, "active origin published");
    (StatusCode::OK, Json(json!({ "delivered": delivered }))).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitiesUpdatedBody {
    #[serde(rename = "type")]
    pub entity_type: String,
}

pub async fn notify_entities_updated(
    State(state): State<AppState>,
    Json(body): Json<EntitiesUpdatedBody>,
) -> Response {
    let entity_type = match UiEntityType::parse(&body.entity_type) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "rejected entities-updated notification");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    let delivered = state.notify_entities_updated(entity_type).await;
    (StatusCode::OK, Json(json!({ "delivered": delivered }))).into_response()
}
