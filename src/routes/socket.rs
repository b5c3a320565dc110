use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::realtime::RealtimeEvent;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}

/// Authenticates before the upgrade completes. Browser WebSocket clients
/// cannot set headers, so the token is also accepted as a query parameter.
pub async fn upgrade(
    State(state): State<SharedState>,
    Query(params): Query<SocketParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string);
    let token = bearer
        .or(params.token)
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

    let claims = jwt::decode_token(&token, &state.config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    let user_id = claims.sub;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: SharedState, user_id: Uuid) {
    // Subscribe before the greeting so nothing published in between is missed.
    let mut rx = state.events.subscribe(user_id);
    let (mut sender, mut receiver) = socket.split();

    if send_event(&mut sender, &RealtimeEvent::connected(user_id))
        .await
        .is_err()
    {
        return;
    }

    tracing::debug!(%user_id, "websocket session joined");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if send_event(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(%user_id, missed, "websocket receiver lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            // Client application messages carry no meaning here; only the
            // close handshake and connection errors matter.
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!(%user_id, "websocket session closed");
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &RealtimeEvent,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(text) => sender.send(Message::Text(text.into())).await,
        Err(e) => {
            tracing::error!("failed to serialize realtime event: {e}");
            Ok(())
        }
    }
}
