//! Wire events for the duplex channel.
//!
//! Events are JSON text frames tagged by `"type"`, with kebab-case event
//! names and camelCase fields. SDP payloads are opaque JSON values and are
//! forwarded unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::chat::ChatRecord;
use crate::rooms::{ConnectionId, ParticipantSnapshot};
use crate::uploads::FileMeta;

/// Client-to-server events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Keepalive.
    Ping,
    /// Join a room by code.
    JoinRoom { room_id: String, nickname: String },
    /// Camera-session SDP offer for a specific peer.
    Offer {
        room_id: String,
        offer: Value,
        to: ConnectionId,
    },
    /// Camera-session SDP answer for a specific peer.
    Answer {
        room_id: String,
        answer: Value,
        to: ConnectionId,
    },
    /// Screen-session SDP offer.
    ScreenShareOffer {
        room_id: String,
        offer: Value,
        to: ConnectionId,
    },
    /// Screen-session SDP answer.
    ScreenShareAnswer {
        room_id: String,
        answer: Value,
        to: ConnectionId,
    },
    /// Announce screen sharing. The server takes the sharer's identity from
    /// room state; the client-supplied fields are accepted for wire
    /// compatibility only.
    ScreenShareStart {
        room_id: String,
        #[serde(default)]
        user_id: Option<ConnectionId>,
        #[serde(default)]
        user_name: Option<String>,
    },
    /// Stop screen sharing.
    ScreenShareStop {
        room_id: String,
        #[serde(default)]
        user_id: Option<ConnectionId>,
    },
    /// Chat message with optional file attachment.
    ChatMessage {
        #[serde(default)]
        message: String,
        #[serde(default)]
        file: Option<FileMeta>,
    },
    /// Set the sender's mute flag.
    ToggleMute { is_muted: bool },
    /// Set the sender's hand-raised flag.
    ToggleRaiseHand { is_hand_raised: bool },
    /// Begin a chunked upload.
    FileUploadStart {
        room_id: String,
        original_name: String,
        mime_type: String,
        size: i64,
    },
    /// Append a base64-encoded chunk to an upload.
    FileUploadChunk { upload_id: Uuid, chunk: String },
    /// Finalize an upload.
    FileUploadComplete { upload_id: Uuid },
}

/// Server-to-client events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Keepalive response.
    Pong,
    /// Join succeeded; the full current room view.
    RoomJoined {
        room_id: String,
        participants: Vec<ParticipantSnapshot>,
        is_host: bool,
    },
    /// Another participant joined.
    UserJoined {
        #[serde(flatten)]
        participant: ParticipantSnapshot,
    },
    /// A participant left.
    UserLeft {
        socket_id: ConnectionId,
        nickname: String,
    },
    /// Relayed camera-session offer.
    Offer { offer: Value, from: ConnectionId },
    /// Relayed camera-session answer.
    Answer { answer: Value, from: ConnectionId },
    /// Relayed screen-session offer.
    ScreenShareOffer { offer: Value, from: ConnectionId },
    /// Relayed screen-session answer.
    ScreenShareAnswer { answer: Value, from: ConnectionId },
    /// A participant started sharing their screen.
    ScreenShareStart {
        user_id: ConnectionId,
        user_name: String,
    },
    /// A participant stopped sharing their screen.
    ScreenShareStop { user_id: ConnectionId },
    /// Chat record fan-out (sender included).
    ChatMessage {
        #[serde(flatten)]
        record: ChatRecord,
    },
    /// A participant's mute flag changed.
    UserMuteChanged {
        socket_id: ConnectionId,
        is_muted: bool,
    },
    /// A participant's hand-raised flag changed.
    UserHandRaised {
        socket_id: ConnectionId,
        is_hand_raised: bool,
        nickname: String,
    },
    /// Positive ack for `file-upload-start`.
    FileUploadStarted { upload_id: Uuid },
    /// Positive ack for `file-upload-chunk`; cumulative bytes received.
    FileUploadProgress { upload_id: Uuid, received: u64 },
    /// Positive ack for `file-upload-complete`.
    FileUploadCompleted { upload_id: Uuid, file: FileMeta },
    /// Negative ack or asynchronous abort notification for an upload.
    /// `upload_id` is absent when `file-upload-start` itself was rejected.
    FileUploadError {
        #[serde(skip_serializing_if = "Option::is_none")]
        upload_id: Option<Uuid>,
        error: String,
    },
    /// Request-level failure (join errors and the like).
    Error { message: String },
}
