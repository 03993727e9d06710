//! WebRTC signaling relay
//!
//! Peers join rooms and exchange session descriptions and ICE candidates
//! through the server. The relay never inspects what it forwards: every
//! `offer`, `answer` and `ice-candidate` goes verbatim to every other member
//! of the named room.
//!
//! Frames are JSON text messages shaped `{"event": <name>, "data": <payload>}`.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

/// Connection identifier, unique per socket
pub type ConnId = String;

/// Events buffered per peer before further events to it are dropped
pub const PEER_QUEUE_CAPACITY: usize = 64;

// ============================================================================
// Protocol
// ============================================================================

/// Events a client sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Enter a room
    #[serde(rename = "join_room")]
    JoinRoom(String),

    /// SDP offer for a room
    #[serde(rename = "offer")]
    Offer(SignalPayload),

    /// SDP answer for a room
    #[serde(rename = "answer")]
    Answer(SignalPayload),

    /// ICE candidate for a room
    #[serde(rename = "ice-candidate")]
    IceCandidate(CandidatePayload),
}

/// Session description addressed to a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPayload {
    /// Destination room
    pub to_room: String,
    /// Opaque session description
    #[serde(default)]
    pub signal: Value,
}

/// ICE candidate addressed to a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePayload {
    /// Destination room
    pub to_room: String,
    /// Opaque candidate
    #[serde(default)]
    pub candidate: Value,
}

/// Events the server sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Another participant entered one of your rooms
    #[serde(rename = "user_joined")]
    UserJoined(ConnId),

    /// Relayed offer
    #[serde(rename = "offer")]
    Offer {
        /// Session description as sent
        signal: Value,
        /// Sender
        from: ConnId,
    },

    /// Relayed answer
    #[serde(rename = "answer")]
    Answer {
        /// Session description as sent
        signal: Value,
        /// Sender
        from: ConnId,
    },

    /// Relayed ICE candidate
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        /// Candidate as sent
        candidate: Value,
        /// Sender
        from: ConnId,
    },
}

// ============================================================================
// Hub
// ============================================================================

#[derive(Default)]
struct HubState {
    rooms: HashMap<String, HashSet<ConnId>>,
    peers: HashMap<ConnId, mpsc::Sender<ServerEvent>>,
    memberships: HashMap<ConnId, HashSet<String>>,
}

/// Room membership table and fan-out for one process
///
/// State is in-memory; running several instances needs a shared broker.
#[derive(Default)]
pub struct SignalingHub {
    state: RwLock<HubState>,
}

impl SignalingHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and get the channel its outbound events arrive on
    pub async fn connect(&self) -> (ConnId, mpsc::Receiver<ServerEvent>) {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(PEER_QUEUE_CAPACITY);
        self.state.write().await.peers.insert(id.clone(), tx);
        debug!(conn = %id, "Signaling peer connected");
        (id, rx)
    }

    /// Add `conn` to `room` and tell the other members
    ///
    /// The joiner is not told who is already there. Returns how many members
    /// were notified.
    pub async fn join(&self, conn: &str, room: &str) -> usize {
        let mut state = self.state.write().await;
        if !state.peers.contains_key(conn) {
            return 0;
        }

        state
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn.to_string());
        state
            .memberships
            .entry(conn.to_string())
            .or_default()
            .insert(room.to_string());

        let notified = Self::fan_out(&state, conn, room, &ServerEvent::UserJoined(conn.to_string()));
        info!(conn = %conn, room = %room, notified, "Joined room");
        notified
    }

    /// Deliver `event` to every member of `room` except `from`
    ///
    /// `from` does not need to be a member. Unknown rooms deliver to nobody.
    /// A member whose queue is full misses the event.
    pub async fn relay(&self, from: &str, room: &str, event: ServerEvent) -> usize {
        let state = self.state.read().await;
        let delivered = Self::fan_out(&state, from, room, &event);
        debug!(from = %from, room = %room, delivered, "Relayed signal");
        delivered
    }

    /// Remove `conn` from every room it joined
    ///
    /// Rooms left empty are dropped. Remaining members are not notified.
    pub async fn disconnect(&self, conn: &str) {
        let mut state = self.state.write().await;
        state.peers.remove(conn);
        let rooms = state.memberships.remove(conn).unwrap_or_default();
        for room in rooms {
            let now_empty = match state.rooms.get_mut(&room) {
                Some(members) => {
                    members.remove(conn);
                    members.is_empty()
                }
                None => false,
            };
            if now_empty {
                state.rooms.remove(&room);
            }
        }
        info!(conn = %conn, "Signaling peer disconnected");
    }

    /// Apply a client event on behalf of `conn`
    pub async fn handle(&self, conn: &str, event: ClientEvent) -> usize {
        let from = conn.to_string();
        match event {
            ClientEvent::JoinRoom(room) => self.join(conn, &room).await,
            ClientEvent::Offer(SignalPayload { to_room, signal }) => {
                self.relay(conn, &to_room, ServerEvent::Offer { signal, from })
                    .await
            }
            ClientEvent::Answer(SignalPayload { to_room, signal }) => {
                self.relay(conn, &to_room, ServerEvent::Answer { signal, from })
                    .await
            }
            ClientEvent::IceCandidate(CandidatePayload { to_room, candidate }) => {
                self.relay(conn, &to_room, ServerEvent::IceCandidate { candidate, from })
                    .await
            }
        }
    }

    /// Number of members in `room`
    pub async fn room_size(&self, room: &str) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(room)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Number of non-empty rooms
    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }

    /// Number of connected peers
    pub async fn peer_count(&self) -> usize {
        self.state.read().await.peers.len()
    }

    fn fan_out(state: &HubState, from: &str, room: &str, event: &ServerEvent) -> usize {
        let Some(members) = state.rooms.get(room) else {
            return 0;
        };
        let mut delivered = 0;
        for (member, tx) in members
            .iter()
            .filter(|member| member.as_str() != from)
            .filter_map(|member| state.peers.get(member).map(|tx| (member, tx)))
        {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(conn = %member, room = %room, "Peer queue full, dropping signal");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Drive one WebSocket connection until it closes
pub async fn handle_socket(socket: WebSocket, hub: std::sync::Arc<SignalingHub>) {
    let (mut sender, mut receiver) = socket.split();
    let (conn, mut outbound) = hub.connect().await;

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Failed to encode signaling event"),
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    hub.handle(&conn, event).await;
                }
                Err(e) => {
                    debug!(conn = %conn, error = %e, "Dropping malformed signaling frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!(conn = %conn, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    hub.disconnect(&conn).await;
    writer.abort();
}
