//! WebSocket Event Broadcasting
//!
//! Real-time fan-out of board mutations. Publishing is fire-and-forget over a
//! tokio broadcast channel; each WebSocket connection subscribes to the
//! channel and forwards only the events of the conversation it joined.
//!
//! ## Architecture
//!
//! - Events are published with their conversation as topic
//! - Subscribers must be participants of the conversation they join
//! - Slow subscribers lag and are told how many events they missed
//! - JSON-serialized events using the WsEvent enum

use crate::access::resolve_participant;
use crate::error::ApiResult;
use crate::events::WsEvent;
use crate::middleware::AuthExtractor;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use trellis_core::ConversationId;

/// An event together with the conversation topic it was published on.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub conversation_id: ConversationId,
    pub event: WsEvent,
}

/// WebSocket state shared across the application.
#[derive(Clone)]
pub struct WsState {
    /// Every connected client subscribes here and filters by conversation.
    tx: broadcast::Sender<Published>,
}

impl WsState {
    /// Create a new WebSocket state with the specified channel capacity.
    ///
    /// The capacity is how many events a subscriber may fall behind before
    /// it starts missing them.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to the subscribers of `conversation_id`.
    ///
    /// Never fails: with no subscribers the event is dropped.
    pub fn publish(&self, conversation_id: ConversationId, event: WsEvent) {
        let event_type = event.event_type();
        match self.tx.send(Published { conversation_id, event }) {
            Ok(receiver_count) => {
                debug!(
                    conversation_id = %conversation_id,
                    event_type = event_type,
                    receivers = receiver_count,
                    "Broadcast event"
                );
            }
            Err(_) => {
                debug!(
                    conversation_id = %conversation_id,
                    event_type = event_type,
                    "No receivers for event"
                );
            }
        }
    }

    /// Subscribe to the event stream of every conversation.
    ///
    /// The receiver must be polled to avoid lagging.
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// WebSocket upgrade handler for `GET /api/v1/conversations/{cid}/ws`.
///
/// ## Protocol
///
/// 1. Client connects with a bearer token
/// 2. Server checks the caller is a participant of the conversation
/// 3. Connection upgraded to WebSocket
/// 4. Server sends a `connected` frame
/// 5. Server streams the conversation's events
/// 6. On disconnect, server sends a `disconnected` frame
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Response> {
    let participant = resolve_participant(state.access.as_ref(), conversation_id, &auth).await?;

    info!(
        conversation_id = %conversation_id,
        user_id = %participant.user_id,
        role = %participant.role,
        "WebSocket connection request"
    );

    let ws_state = state.ws.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, ws_state, conversation_id)))
}

/// Runs for the lifetime of one WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>, conversation_id: ConversationId) {
    info!(conversation_id = %conversation_id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.subscribe();

    if let Err(e) = send_event(&mut sender, &WsEvent::Connected { conversation_id }).await {
        error!(conversation_id = %conversation_id, error = %e, "Failed to send connected frame");
        return;
    }

    // Client frames carry nothing we act on; this task only notices the close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    debug!(conversation_id = %conversation_id, "Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Text(text)) => {
                    debug!(
                        conversation_id = %conversation_id,
                        len = text.len(),
                        "Received text message (ignored)"
                    );
                }
                Ok(Message::Binary(data)) => {
                    debug!(
                        conversation_id = %conversation_id,
                        len = data.len(),
                        "Received binary message (ignored)"
                    );
                }
                Err(e) => {
                    warn!(conversation_id = %conversation_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(published) => {
                        if !should_send_event(&published, conversation_id) {
                            continue;
                        }
                        if let Err(e) = send_event(&mut sender, &published.event).await {
                            warn!(
                                conversation_id = %conversation_id,
                                error = %e,
                                "Failed to send event, closing connection"
                            );
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            conversation_id = %conversation_id,
                            skipped = skipped,
                            "Client lagged, some events were dropped"
                        );
                        let error_event = WsEvent::Error {
                            message: format!("Lagged: {} events dropped", skipped),
                        };
                        if let Err(e) = send_event(&mut sender, &error_event).await {
                            warn!(conversation_id = %conversation_id, error = %e, "Failed to send error frame");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(conversation_id = %conversation_id, "Broadcast channel closed");
                        break;
                    }
                }
            }

            _ = &mut recv_task => {
                debug!(conversation_id = %conversation_id, "Receiver task finished");
                break;
            }
        }
    }

    recv_task.abort();
    let disconnected = WsEvent::Disconnected {
        reason: "Connection closed".to_string(),
    };
    let _ = send_event(&mut sender, &disconnected).await;

    info!(conversation_id = %conversation_id, "WebSocket disconnected");
}

async fn send_event(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    event: &WsEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(|e| {
        error!(error = %e, "Failed to serialize event");
        axum::Error::new(e)
    })?;

    sender.send(Message::Text(json)).await
}

/// Only events published on the client's own conversation are forwarded.
fn should_send_event(published: &Published, client_conversation_id: ConversationId) -> bool {
    published.conversation_id == client_conversation_id
}
