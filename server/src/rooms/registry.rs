//! Room registry: minting, lookup, join and leave.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info};

use super::code;
use super::error::RoomError;
use super::room::{ConnectionId, Participant, ParticipantSnapshot, Room, MAX_PARTICIPANTS};
use crate::ws::connection::ConnectionHandle;
use crate::ws::events::ServerEvent;

/// Maximum nickname length in characters.
const MAX_NICKNAME_LEN: usize = 40;

/// Successful join result: the view the joining client receives in
/// `room-joined`.
pub struct JoinedRoom {
    /// Canonical room code.
    pub room_id: String,
    /// All participants in insertion order, the joiner included.
    pub participants: Vec<ParticipantSnapshot>,
    /// Whether the joiner is the room's host.
    pub is_host: bool,
    /// True when the connection was already a participant (idempotent rejoin).
    pub rejoined: bool,
}

/// Authoritative map from room code to Room.
///
/// Instantiable in isolation; no process-wide singletons.
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Mint a fresh room code and register an empty room under it.
    pub fn mint(&self) -> String {
        loop {
            let candidate = code::generate();
            match self.rooms.entry(candidate.clone()) {
                dashmap::Entry::Occupied(_) => continue,
                dashmap::Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Room::new(candidate.clone())));
                    info!(room = %candidate, "Room minted");
                    return candidate;
                }
            }
        }
    }

    /// Look up a room by code, case-insensitively.
    #[must_use]
    pub fn lookup(&self, room_code: &str) -> Option<Arc<Room>> {
        self.rooms
            .get(&code::canonicalize(room_code))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Join a room: atomic validation, insertion, and `user-joined` fan-out
    /// to the existing participants.
    ///
    /// Rejoin by a connection that is already a participant succeeds without
    /// mutation and returns the current view.
    pub async fn join(
        &self,
        room_code: &str,
        handle: ConnectionHandle,
        nickname: &str,
    ) -> Result<JoinedRoom, RoomError> {
        let nickname = validate_nickname(nickname)?;
        let room = self.lookup(room_code).ok_or(RoomError::RoomNotFound)?;
        let conn_id = handle.conn_id;

        let mut state = room.state.write().await;
        if state.destroyed {
            return Err(RoomError::RoomNotFound);
        }

        if let Some(existing) = state.find(conn_id) {
            let is_host = state.host == Some(existing.conn_id);
            return Ok(JoinedRoom {
                room_id: room.code.clone(),
                participants: state.snapshots(),
                is_host,
                rejoined: true,
            });
        }

        if state.participants.len() >= MAX_PARTICIPANTS {
            return Err(RoomError::RoomFull);
        }
        if state.nickname_taken(nickname) {
            return Err(RoomError::NicknameTaken);
        }

        let is_host = state.host.is_none();
        let participant = Participant {
            conn_id,
            nickname: nickname.to_string(),
            muted: false,
            hand_raised: false,
            screen_sharing: false,
            video_enabled: true,
            joined_at: Utc::now(),
            handle,
        };
        let snapshot = participant.snapshot();

        state.broadcast_all(&ServerEvent::UserJoined {
            participant: snapshot,
        });

        state.participants.push(participant);
        if is_host {
            state.host = Some(conn_id);
        }

        info!(
            room = %room.code,
            conn = %conn_id,
            nickname = %nickname,
            participants = state.participants.len(),
            is_host,
            "Participant joined"
        );

        Ok(JoinedRoom {
            room_id: room.code.clone(),
            participants: state.snapshots(),
            is_host,
            rejoined: false,
        })
    }

    /// Remove a participant, transfer host if needed, fan out `user-left`,
    /// and destroy the room when it empties.
    ///
    /// Returns the departed nickname, or None when the connection was not a
    /// participant.
    pub async fn leave(&self, room_code: &str, conn_id: ConnectionId) -> Option<String> {
        let room = self.lookup(room_code)?;

        let mut state = room.state.write().await;
        let idx = state
            .participants
            .iter()
            .position(|p| p.conn_id == conn_id)?;
        let departed = state.participants.remove(idx);

        state.broadcast_all(&ServerEvent::UserLeft {
            socket_id: conn_id,
            nickname: departed.nickname.clone(),
        });

        if state.host == Some(conn_id) {
            // Insertion-order-earliest survivor becomes host.
            state.host = state.participants.first().map(|p| p.conn_id);
            if let Some(new_host) = state.host {
                debug!(room = %room.code, conn = %new_host, "Host transferred");
            }
        }

        info!(
            room = %room.code,
            conn = %conn_id,
            nickname = %departed.nickname,
            remaining = state.participants.len(),
            "Participant left"
        );

        let emptied = state.participants.is_empty();
        if emptied {
            // Mark before eviction so a join racing on a stale Arc fails
            // instead of resurrecting the code.
            state.destroyed = true;
            state.host = None;
        }
        drop(state);

        if emptied {
            self.rooms.remove(&room.code);
            info!(room = %room.code, "Room destroyed");
        }
        Some(departed.nickname)
    }
}

/// Validate an untrusted nickname: trimmed, 1-40 characters, no control
/// characters.
fn validate_nickname(raw: &str) -> Result<&str, RoomError> {
    let nickname = raw.trim();
    if nickname.is_empty()
        || nickname.chars().count() > MAX_NICKNAME_LEN
        || nickname.chars().any(char::is_control)
    {
        return Err(RoomError::InvalidNickname);
    }
    Ok(nickname)
}
