//! Signaling Router
//!
//! Relays opaque SDP offers/answers between participant pairs for the two
//! parallel session kinds (camera and screen), and arbitrates the room's
//! single screen-share slot. Payloads are forwarded unchanged; media never
//! touches the server.

use tracing::debug;

use crate::rooms::{ConnectionId, Room};
use crate::ws::events::ServerEvent;

/// Relay a pre-built signaling event from `from` to `to` within one room.
///
/// The sender must be a participant; the recipient is resolved only inside
/// this room and absence is a silent drop (it may have just left).
pub async fn relay(room: &Room, from: ConnectionId, to: ConnectionId, event: ServerEvent) {
    let state = room.state.read().await;
    if state.find(from).is_none() {
        debug!(room = %room.code, conn = %from, "Signaling from non-participant dropped");
        return;
    }
    match state.find(to) {
        Some(recipient) => {
            recipient.handle.send(event);
        }
        None => {
            debug!(room = %room.code, to = %to, "Signaling recipient absent, dropped");
        }
    }
}

/// Mark the sender as the room's screen sharer and broadcast the start.
///
/// At most one participant shares at a time: any other sharer's flag is
/// cleared under the same write lock, so a new start supersedes an existing
/// one without negotiation. Clients react to the broadcast by re-pointing
/// their screen peer-connection.
pub async fn screen_share_start(room: &Room, conn_id: ConnectionId) {
    let mut state = room.state.write().await;
    if state.find(conn_id).is_none() {
        debug!(room = %room.code, conn = %conn_id, "Screen-share start from non-participant dropped");
        return;
    }

    let mut user_name = String::new();
    for p in &mut state.participants {
        if p.conn_id == conn_id {
            p.screen_sharing = true;
            user_name = p.nickname.clone();
        } else {
            p.screen_sharing = false;
        }
    }

    debug!(room = %room.code, conn = %conn_id, "Screen share started");
    state.broadcast_all(&ServerEvent::ScreenShareStart {
        user_id: conn_id,
        user_name,
    });
}

/// Clear the sender's screen-share flag and broadcast the stop.
/// Stopping while not sharing is an idempotent no-op.
pub async fn screen_share_stop(room: &Room, conn_id: ConnectionId) {
    let mut state = room.state.write().await;
    let Some(p) = state.find_mut(conn_id) else {
        return;
    };
    if !p.screen_sharing {
        debug!(room = %room.code, conn = %conn_id, "Stop from non-sharer ignored");
        return;
    }
    p.screen_sharing = false;

    debug!(room = %room.code, conn = %conn_id, "Screen share stopped");
    state.broadcast_all(&ServerEvent::ScreenShareStop { user_id: conn_id });
}
