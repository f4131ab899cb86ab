//! Chat Log
//!
//! Per-room ordered chat records with echo fan-out. The log lives and dies
//! with the room; late joiners see no history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::rooms::{ConnectionId, Room};
use crate::uploads::FileMeta;
use crate::ws::events::ServerEvent;

/// One chat message, text and/or file attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    /// Globally unique record ID.
    pub id: Uuid,
    /// Connection ID of the author.
    pub socket_id: ConnectionId,
    /// Author nickname, snapshotted at send time.
    pub nickname: String,
    /// Message text; may be empty when a file is attached.
    pub message: String,
    /// Attached file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileMeta>,
    /// Append time.
    pub timestamp: DateTime<Utc>,
}

/// Append a message to the room's log and fan it out to every participant,
/// the sender included.
///
/// Returns false when the message was ignored: empty with no file, or the
/// sender is not a participant.
pub async fn post_message(
    room: &Room,
    conn_id: ConnectionId,
    message: String,
    file: Option<FileMeta>,
) -> bool {
    if message.is_empty() && file.is_none() {
        debug!(conn = %conn_id, "Ignoring empty chat message");
        return false;
    }

    let mut state = room.state.write().await;
    let Some(sender) = state.find(conn_id) else {
        debug!(conn = %conn_id, room = %room.code, "Chat from non-participant dropped");
        return false;
    };

    let record = ChatRecord {
        id: Uuid::new_v4(),
        socket_id: conn_id,
        nickname: sender.nickname.clone(),
        message,
        file,
        timestamp: Utc::now(),
    };

    state.broadcast_all(&ServerEvent::ChatMessage {
        record: record.clone(),
    });
    state.chat.push(record);
    true
}
