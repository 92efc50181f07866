//! WebSocket feed that forwards every notification to connected clients.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::{BroadcastNotifier, Notification};

/// Frames sent to feed clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// Sent once the client is subscribed; nothing raised after it is missed.
    Connected,
    Notification(Notification),
    /// The client fell behind and `missed` notifications were dropped.
    Lagged { missed: u64 },
}

/// Build the notification feed route.
pub fn notification_routes(notifier: Arc<BroadcastNotifier>) -> Router {
    Router::new()
        .route("/ws/notifications", get(ws_handler))
        .with_state(notifier)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(notifier): State<Arc<BroadcastNotifier>>,
) -> impl IntoResponse {
    info!("Notification feed client connecting");
    ws.on_upgrade(move |socket| handle_socket(socket, notifier))
}

async fn send_frame(socket: &mut WebSocket, frame: &FeedMessage) -> bool {
    match serde_json::to_string(frame) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode feed frame");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, notifier: Arc<BroadcastNotifier>) {
    let mut rx = notifier.subscribe();
    if !send_frame(&mut socket, &FeedMessage::Connected).await {
        debug!("Feed client left before the hello frame");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                let frame = match result {
                    Ok(notification) => FeedMessage::Notification(notification),
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Feed client lagged behind broadcast");
                        FeedMessage::Lagged { missed }
                    }
                    Err(RecvError::Closed) => {
                        debug!("Notification channel closed");
                        break;
                    }
                };
                if !send_frame(&mut socket, &frame).await {
                    debug!("Feed client disconnected during send");
                    break;
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(error = %e, "Feed WebSocket error");
                        break;
                    }
                    // The feed is one-way; anything else from the client is ignored.
                    _ => {}
                }
            }
        }
    }

    info!("Notification feed client disconnected");
}
