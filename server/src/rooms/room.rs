//! Room aggregate and participant state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::chat::ChatRecord;
use crate::ws::connection::ConnectionHandle;
use crate::ws::events::ServerEvent;

/// Maximum participants per room.
pub const MAX_PARTICIPANTS: usize = 10;

/// Opaque per-connection identifier. Stable for the life of the WebSocket.
///
/// Its string form is the wire `socketId`; clients compare these
/// lexicographically to pick the camera-offer initiator for a pair.
pub type ConnectionId = Uuid;

/// One live connection bound to a room.
pub struct Participant {
    /// Connection ID of the underlying socket.
    pub conn_id: ConnectionId,
    /// Nickname, unique within the room.
    pub nickname: String,
    /// Whether the participant is muted.
    pub muted: bool,
    /// Whether the participant has their hand raised.
    pub hand_raised: bool,
    /// Whether the participant is the room's current screen sharer.
    pub screen_sharing: bool,
    /// Camera state as rendered by clients. Negotiated peer-to-peer; the
    /// server never mutates it after join.
    pub video_enabled: bool,
    /// When the participant joined.
    pub joined_at: DateTime<Utc>,
    /// Outbound queue handle for fan-out delivery.
    pub handle: ConnectionHandle,
}

impl Participant {
    /// Serializable view of this participant.
    #[must_use]
    pub fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            socket_id: self.conn_id,
            nickname: self.nickname.clone(),
            is_muted: self.muted,
            is_video_enabled: self.video_enabled,
            is_hand_raised: self.hand_raised,
            is_screen_sharing: self.screen_sharing,
            joined_at: self.joined_at,
        }
    }
}

/// Participant view sent in `room-joined` and `user-joined` payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSnapshot {
    /// Connection ID of the participant.
    pub socket_id: ConnectionId,
    /// Nickname.
    pub nickname: String,
    /// Whether the participant is muted.
    pub is_muted: bool,
    /// Whether the participant's camera is on.
    pub is_video_enabled: bool,
    /// Whether the participant has their hand raised.
    pub is_hand_raised: bool,
    /// Whether the participant is sharing their screen.
    pub is_screen_sharing: bool,
    /// When the participant joined.
    pub joined_at: DateTime<Utc>,
}

/// Mutable state of a room. Guarded by the room's lock; every mutation and
/// every fan-out that must preserve mutation order runs under it.
pub struct RoomState {
    /// Current host, if any. Always one of `participants` when set.
    pub host: Option<ConnectionId>,
    /// Participants in insertion order.
    pub participants: Vec<Participant>,
    /// Append-only chat log, alive as long as the room.
    pub chat: Vec<ChatRecord>,
    /// Set under the write lock when the last participant leaves, before the
    /// code is evicted from the registry. A join that raced the eviction and
    /// still holds the Arc must observe it and fail.
    pub destroyed: bool,
}

impl RoomState {
    /// Find a participant by connection ID.
    #[must_use]
    pub fn find(&self, conn_id: ConnectionId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.conn_id == conn_id)
    }

    /// Find a participant by connection ID, mutably.
    pub fn find_mut(&mut self, conn_id: ConnectionId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.conn_id == conn_id)
    }

    /// Whether a nickname is already in use.
    #[must_use]
    pub fn nickname_taken(&self, nickname: &str) -> bool {
        self.participants.iter().any(|p| p.nickname == nickname)
    }

    /// Snapshots of all participants, in insertion order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ParticipantSnapshot> {
        self.participants.iter().map(Participant::snapshot).collect()
    }

    /// Deliver an event to every participant, sender included.
    ///
    /// Delivery is non-blocking (`try_send` into each connection's outbound
    /// queue), so holding the room lock across the loop is what gives
    /// broadcasts the same order as the mutations that triggered them.
    pub fn broadcast_all(&self, event: &ServerEvent) {
        for p in &self.participants {
            p.handle.send(event.clone());
        }
    }

    /// Deliver an event to every participant except one.
    pub fn broadcast_except(&self, exclude: ConnectionId, event: &ServerEvent) {
        for p in &self.participants {
            if p.conn_id != exclude {
                p.handle.send(event.clone());
            }
        }
    }
}

/// A meeting room: code, creation time, and serialized mutable state.
pub struct Room {
    /// Canonical uppercase room code.
    pub code: String,
    /// When the room was minted.
    pub created_at: DateTime<Utc>,
    /// Mutable aggregate, single-writer behind the lock.
    pub state: RwLock<RoomState>,
}

impl Room {
    /// Create an empty room.
    #[must_use]
    pub fn new(code: String) -> Self {
        Self {
            code,
            created_at: Utc::now(),
            state: RwLock::new(RoomState {
                host: None,
                participants: Vec::new(),
                chat: Vec::new(),
                destroyed: false,
            }),
        }
    }

    /// Number of current participants.
    pub async fn participant_count(&self) -> usize {
        self.state.read().await.participants.len()
    }

    /// Set a participant's mute flag and notify the rest of the room.
    /// Unknown connection IDs are ignored.
    pub async fn update_mute(&self, conn_id: ConnectionId, is_muted: bool) {
        let mut state = self.state.write().await;
        if let Some(p) = state.find_mut(conn_id) {
            p.muted = is_muted;
            state.broadcast_except(
                conn_id,
                &ServerEvent::UserMuteChanged {
                    socket_id: conn_id,
                    is_muted,
                },
            );
        }
    }

    /// Set a participant's hand-raised flag and notify the rest of the room.
    pub async fn update_hand_raised(&self, conn_id: ConnectionId, is_hand_raised: bool) {
        let mut state = self.state.write().await;
        if let Some(p) = state.find_mut(conn_id) {
            p.hand_raised = is_hand_raised;
            let nickname = p.nickname.clone();
            state.broadcast_except(
                conn_id,
                &ServerEvent::UserHandRaised {
                    socket_id: conn_id,
                    is_hand_raised,
                    nickname,
                },
            );
        }
    }
}
