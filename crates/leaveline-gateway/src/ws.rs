//! Real-time push channel: per-user WebSocket fan-out of leave events.
//!
//! Events go through a tokio broadcast channel; each connection filters
//! them against its own user before forwarding. Remote clients own their
//! reconnect policy (fixed-interval retry); the server just accepts
//! whatever connection shows up next.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use leaveline_core::config::HEARTBEAT_INTERVAL_SECS;

use crate::app::AppState;

const BROADCAST_CAPACITY: usize = 256;

/// A leave event pushed to connected dashboards.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PushEvent {
    /// A new application landed; for reviewer dashboards.
    ApplicationSubmitted {
        application_id: String,
        applicant_name: String,
        leave_type: String,
    },
    /// A pending application was decided; targeted at the applicant.
    StatusChanged {
        application_id: String,
        applicant_phone: String,
        status: String,
        reviewer_name: String,
    },
}

impl PushEvent {
    /// The user this event targets, or `None` for fan-out to everyone.
    fn recipient(&self) -> Option<&str> {
        match self {
            PushEvent::ApplicationSubmitted { .. } => None,
            PushEvent::StatusChanged { applicant_phone, .. } => Some(applicant_phone),
        }
    }
}

/// Fan-out events to all connected WS clients via tokio broadcast channel.
pub struct EventBroadcaster {
    tx: broadcast::Sender<PushEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }

    /// Push an event to all subscribers. Silently drops when nobody listens.
    pub fn send(&self, event: PushEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Phone-number-like user identity; omit for an unfiltered ops feed.
    #[serde(default)]
    user: String,
}

/// Axum handler — upgrades HTTP to WebSocket at GET /ws.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_connection(socket, query.user, state))
}

/// Per-connection event loop — lives for the entire WS session.
async fn run_connection(socket: WebSocket, user: String, state: Arc<AppState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, user = %user, "new push connection");
    state.ws_clients.insert(conn_id.clone(), user.clone());

    let (mut tx, mut rx) = socket.split();
    let mut broadcast_rx = state.broadcaster.subscribe();

    let mut tick = tokio::time::interval(std::time::Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tick.tick().await; // first tick fires immediately, skip it

    loop {
        tokio::select! {
            msg = rx.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Inbound text is ignored — this channel is push-only.
                    _ => {}
                }
            }

            event = broadcast_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !delivers_to(&event, &user) {
                            continue;
                        }
                        let Ok(payload) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if tx.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    // Lagged receivers just miss events; polling catches up.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            _ = tick.tick() => {
                let payload = serde_json::json!({
                    "event": "tick",
                    "ts": chrono::Utc::now().timestamp_millis(),
                }).to_string();
                if tx.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.ws_clients.remove(&conn_id);
    info!(conn_id = %conn_id, "push connection closed");
}

/// Unfiltered connections see everything; filtered ones see broadcast
/// events plus events addressed to them.
fn delivers_to(event: &PushEvent, user: &str) -> bool {
    if user.is_empty() {
        return true;
    }
    match event.recipient() {
        None => true,
        Some(recipient) => recipient == user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_changed(phone: &str) -> PushEvent {
        PushEvent::StatusChanged {
            application_id: "a1".to_string(),
            applicant_phone: phone.to_string(),
            status: "approved".to_string(),
            reviewer_name: "Dr. Menon".to_string(),
        }
    }

    #[test]
    fn targeted_events_reach_only_their_user() {
        let event = status_changed("+911111111111");
        assert!(delivers_to(&event, "+911111111111"));
        assert!(!delivers_to(&event, "+922222222222"));
        assert!(delivers_to(&event, ""));
    }

    #[test]
    fn submissions_fan_out_to_everyone() {
        let event = PushEvent::ApplicationSubmitted {
            application_id: "a1".to_string(),
            applicant_name: "Asha Rao".to_string(),
            leave_type: "sick".to_string(),
        };
        assert!(delivers_to(&event, "+911111111111"));
        assert!(delivers_to(&event, ""));
    }

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let json = serde_json::to_string(&status_changed("+911111111111")).unwrap();
        assert!(json.contains("\"event\":\"status_changed\""));
        assert!(json.contains("\"status\":\"approved\""));
    }
}
