// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workload WebSocket: streams job progress for the session's user.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Extension, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{future, SinkExt, StreamExt};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::SessionUser;
use crate::services::BridgeSession;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/workload/socket", get(workload_socket))
}

/// Upgrade to a WebSocket and relay job events over it.
///
/// Preconditions are checked before the upgrade is looked at, so an
/// unauthenticated session gets an HTTP error and no job is started.
async fn workload_socket(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionUser>,
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response> {
    let user = state
        .registry
        .get_user(session.user_id)
        .ok_or(AppError::NoSession)?;
    let bridge = state.bridge.prepare(&user)?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(user_id = user.id, error = %rejection, "WebSocket upgrade rejected");
            return Ok(rejection.into_response());
        }
    };

    Ok(ws.on_upgrade(move |socket| relay(socket, bridge)))
}

async fn relay(socket: WebSocket, bridge: BridgeSession) {
    let user_id = bridge.user_id();
    tracing::info!(user_id, "Workload socket opened");

    let (ws_tx, ws_rx) = socket.split();
    let outbound = Box::pin(ws_tx.with(|text: String| {
        future::ready(Ok::<_, axum::Error>(Message::Text(text.into())))
    }));
    let inbound = ws_rx.filter_map(|frame| future::ready(inbound_text(frame)));

    let outcome = bridge.run(outbound, inbound).await;
    tracing::info!(user_id, ?outcome, "Workload socket closed");
}

/// Map a raw frame to client text, skipping control and binary frames.
/// A close frame or read error becomes an error item, which ends the stream
/// from the bridge's point of view.
fn inbound_text(
    frame: std::result::Result<Message, axum::Error>,
) -> Option<std::result::Result<String, AppError>> {
    match frame {
        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(Message::Close(_)) => Some(Err(AppError::TransportClosed(
            "client sent close frame".to_string(),
        ))),
        Ok(_) => None,
        Err(e) => Some(Err(AppError::TransportClosed(e.to_string()))),
    }
}
