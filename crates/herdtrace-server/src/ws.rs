//! WebSocket delivery for real-time events.
//!
//! Every event goes through one process-wide broadcast channel; each
//! connected socket filters for deliveries addressed to its own user or,
//! for vets, to the whole vet pool. Delivery is fire-and-forget: a lagging
//! or disconnected socket loses events without affecting the sender.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use herdtrace_core::{Event, Notifier, Role};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{error::AppError, state::AppState};

/// Who an outbound event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    User(String),
    AllVets,
}

/// One event in flight on the broadcast channel.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub recipient: Recipient,
    pub event: Event,
}

impl Outbound {
    fn matches(&self, user_id: &str, role: Role) -> bool {
        match &self.recipient {
            Recipient::User(id) => id == user_id,
            Recipient::AllVets => role == Role::Vet,
        }
    }
}

/// [`Notifier`] that fans events out to every live socket.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Outbound>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.tx.subscribe()
    }

    fn send(&self, outbound: Outbound) {
        // Err means nobody is connected right now; the event is dropped.
        if self.tx.send(outbound).is_err() {
            debug!("no live sockets, event dropped");
        }
    }
}

impl Notifier for BroadcastNotifier {
    fn notify_user(&self, user_id: &str, event: &Event) {
        self.send(Outbound {
            recipient: Recipient::User(user_id.to_string()),
            event: event.clone(),
        });
    }

    fn broadcast_vets(&self, event: &Event) {
        self.send(Outbound {
            recipient: Recipient::AllVets,
            event: event.clone(),
        });
    }
}

/// Identity a socket announces when connecting. Headers are not available
/// to browser WebSocket clients, so it rides in the query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsParams {
    pub user_id: String,
    pub role: Role,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, params: WsParams) {
    let mut rx = state.notifier.subscribe();
    info!(user_id = %params.user_id, role = params.role.as_str(), "socket connected");
    if params.role == Role::Vet {
        set_online(&state, &params.user_id, true);
    }

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Ok(delivery) => {
                    if !delivery.matches(&params.user_id, params.role) {
                        continue;
                    }
                    let text = match serde_json::to_string(&delivery.event) {
                        Ok(text) => text,
                        Err(err) => {
                            warn!(error = %err, "failed to serialize event");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %params.user_id, skipped, "socket lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    if params.role == Role::Vet {
        set_online(&state, &params.user_id, false);
    }
    info!(user_id = %params.user_id, "socket disconnected");
}

/// Best-effort online-flag update; a storage failure only loses presence
/// tracking, never the socket.
fn set_online(state: &AppState, vet_id: &str, online: bool) {
    let result = state
        .db()
        .and_then(|db| db.set_vet_online(vet_id, online).map_err(AppError::from));
    if let Err(err) = result {
        warn!(error = %err, vet_id, "failed to update online flag");
    }
}
