//! WebSocket handler for UI front-ends.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS and create one `UiConnection` per socket
//! - Single writer: drain the connection's outbound queue onto the socket
//! - Reader: decode each frame once and dispatch it in its own task
//! - Lifecycle: ping interval, idle timeout, disconnect teardown

use std::sync::Arc;

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::app_state::AppState;
use crate::connection::UiConnection;
use crate::transport::codec::{decode, Inbound};

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let session = app.connections().next_session_id();
        let span = info_span!("ui_session", %session);
        run_session(app, session, socket).instrument(span).await;
    })
}

async fn run_session(app: AppState, session: String, socket: WebSocket) {
    let gw = &app.cfg().gateway;
    let (conn, mut out_rx) = UiConnection::new(
        session.clone(),
        app.origin_source(),
        app.metrics(),
        gw.outbound_queue,
    );
    app.connections().insert(Arc::clone(&conn));
    app.metrics().ui_connections.inc();
    info!("ui session opened");

    let dispatcher = app.dispatcher();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut ping_tick = tokio::time::interval(Duration::from_millis(gw.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(frame) = maybe_out else { break; };
                if ws_tx.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                match decode(msg) {
                    Inbound::Envelope(env) => {
                        let dispatcher = Arc::clone(&dispatcher);
                        let conn = Arc::clone(&conn);
                        tokio::spawn(
                            async move { dispatcher.dispatch(&conn, env).await }
                                .in_current_span(),
                        );
                    }
                    Inbound::Undecodable(reason) => {
                        warn!(%reason, "dropping undecodable frame");
                    }
                    Inbound::Ping(payload) => {
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Inbound::Pong => {}
                    Inbound::Close => break,
                }
            }

            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    debug!("idle timeout");
                    break;
                }
            }
        }
    }

    // Stop pushes first, then close the queue so late replies are dropped.
    conn.disconnect();
    drop(out_rx);
    app.connections().remove(&session);
    app.metrics().ui_connections.dec();
    let _ = ws_tx.close().await;
    info!("ui session closed");
}
