use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use amora_crypto::pubkey::Pubkey;

use crate::{
    config::ServerConfig,
    metrics::RelayMetrics,
    protocol::ClientFrame,
    registry::{ConnectionRegistry, RouteOutcome},
    session::Session,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub metrics: Arc<RelayMetrics>,
    pub config: ServerConfig,
}

// GET /v1/ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (mut session, mut outbound) = Session::new(
        state.registry.clone(),
        state.metrics.clone(),
        state.config.max_frame_bytes,
    );

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = session.handle_text(&text) {
                            if socket.send(Message::Text(reply)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Binary frames are ignored; pings are answered by the
                    // transport layer
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("websocket error: {}", e);
                        break;
                    }
                }
            }
            forwarded = outbound.recv() => {
                match forwarded {
                    Some(frame) => {
                        if socket.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    session.close();
}

// POST /v1/send
//
// One forward without holding a socket. The only surface where
// unroutability is visible to the caller.
pub async fn post_send(State(state): State<AppState>, body: String) -> Response {
    if body.len() > state.config.max_frame_bytes {
        state.metrics.frame_errors.inc();
        return (StatusCode::PAYLOAD_TOO_LARGE, "frame too large").into_response();
    }

    let recipient = match serde_json::from_str::<ClientFrame>(&body) {
        Ok(ClientFrame::Message { recipient, .. }) => recipient,
        Ok(_) | Err(_) => {
            state.metrics.frame_errors.inc();
            return (StatusCode::BAD_REQUEST, "expected a message frame").into_response();
        }
    };

    let recipient: Pubkey = match recipient.parse() {
        Ok(recipient) => recipient,
        Err(_) => {
            state.metrics.frame_errors.inc();
            return (StatusCode::BAD_REQUEST, "invalid identifier").into_response();
        }
    };

    match state.registry.route(&recipient, body) {
        RouteOutcome::Delivered => {
            state.metrics.frames_forwarded.inc();
            (StatusCode::OK, Json(json!({ "delivered": true }))).into_response()
        }
        RouteOutcome::NotConnected => {
            state.metrics.frames_dropped_unroutable.inc();
            (StatusCode::NOT_FOUND, Json(json!({ "delivered": false }))).into_response()
        }
        RouteOutcome::QueueFull => {
            state.metrics.frames_dropped_queue_full.inc();
            (StatusCode::NOT_FOUND, Json(json!({ "delivered": false }))).into_response()
        }
    }
}

// GET /health
pub async fn get_health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "connections": state.metrics.active_connections.get() as u64,
        "identifiers": state.registry.len(),
    }))
    .into_response()
}

// GET /metrics
pub async fn get_metrics(State(state): State<AppState>) -> Response {
    state.metrics.export_prometheus().into_response()
}
