//! uiBridge gateway binary.
//!
//! - UI endpoint: /v1/ui (WebSocket, `{id, payload}` envelopes)
//! - Background notifications: /v1/notify/active-origin, /v1/notify/entities-updated
//! - Ops: /healthz, /metrics

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use uibridge_core::error::{BridgeError, Result};
use uibridge_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "uibridge-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "uibridge.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| BridgeError::Config(format!("gateway.listen is not a socket address: {e}")))?;

    let (state, _backend) = AppState::with_memory_backend(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "uibridge-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| BridgeError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| BridgeError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl_c handler failed");
    }
    tracing::info!("shutdown requested");
}
