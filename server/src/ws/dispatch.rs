//! Inbound event dispatch.
//!
//! One handler per event variant. Protocol violations (events for rooms the
//! connection is not bound to, toggles from unbound connections, malformed
//! payloads) are dropped silently; request failures are answered on the
//! originating connection only.

use std::sync::Arc;

use base64::Engine;
use tracing::debug;
use uuid::Uuid;

use super::connection::{ConnectionContext, ConnectionHandle};
use super::events::{ClientEvent, ServerEvent};
use crate::api::AppState;
use crate::rooms::{code, Room};
use crate::uploads::UploadError;
use crate::{chat, signaling};

/// Route one inbound event to its handler.
pub async fn handle_event(
    state: &AppState,
    ctx: &mut ConnectionContext,
    handle: &ConnectionHandle,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Ping => {
            handle.send(ServerEvent::Pong);
        }

        ClientEvent::JoinRoom { room_id, nickname } => {
            handle_join(state, ctx, handle, &room_id, &nickname).await;
        }

        ClientEvent::Offer { room_id, offer, to } => {
            if let Some(room) = bound_room(state, ctx, &room_id) {
                let event = ServerEvent::Offer {
                    offer,
                    from: handle.conn_id,
                };
                signaling::relay(&room, handle.conn_id, to, event).await;
            }
        }

        ClientEvent::Answer { room_id, answer, to } => {
            if let Some(room) = bound_room(state, ctx, &room_id) {
                let event = ServerEvent::Answer {
                    answer,
                    from: handle.conn_id,
                };
                signaling::relay(&room, handle.conn_id, to, event).await;
            }
        }

        ClientEvent::ScreenShareOffer { room_id, offer, to } => {
            if let Some(room) = bound_room(state, ctx, &room_id) {
                let event = ServerEvent::ScreenShareOffer {
                    offer,
                    from: handle.conn_id,
                };
                signaling::relay(&room, handle.conn_id, to, event).await;
            }
        }

        ClientEvent::ScreenShareAnswer { room_id, answer, to } => {
            if let Some(room) = bound_room(state, ctx, &room_id) {
                let event = ServerEvent::ScreenShareAnswer {
                    answer,
                    from: handle.conn_id,
                };
                signaling::relay(&room, handle.conn_id, to, event).await;
            }
        }

        ClientEvent::ScreenShareStart { room_id, .. } => {
            if let Some(room) = bound_room(state, ctx, &room_id) {
                signaling::screen_share_start(&room, handle.conn_id).await;
            }
        }

        ClientEvent::ScreenShareStop { room_id, .. } => {
            if let Some(room) = bound_room(state, ctx, &room_id) {
                signaling::screen_share_stop(&room, handle.conn_id).await;
            }
        }

        ClientEvent::ChatMessage { message, file } => {
            if let Some(room) = current_room(state, ctx) {
                chat::post_message(&room, handle.conn_id, message, file).await;
            } else {
                debug!(conn = %handle.conn_id, "Chat from unbound connection dropped");
            }
        }

        ClientEvent::ToggleMute { is_muted } => {
            if let Some(room) = current_room(state, ctx) {
                room.update_mute(handle.conn_id, is_muted).await;
            }
        }

        ClientEvent::ToggleRaiseHand { is_hand_raised } => {
            if let Some(room) = current_room(state, ctx) {
                room.update_hand_raised(handle.conn_id, is_hand_raised).await;
            }
        }

        ClientEvent::FileUploadStart {
            room_id,
            original_name,
            mime_type,
            size,
        } => {
            handle_upload_start(state, handle, &room_id, &original_name, mime_type, size).await;
        }

        ClientEvent::FileUploadChunk { upload_id, chunk } => {
            handle_upload_chunk(state, handle, upload_id, &chunk).await;
        }

        ClientEvent::FileUploadComplete { upload_id } => {
            match state.uploads.complete(handle.conn_id, upload_id).await {
                Ok(file) => {
                    handle.send(ServerEvent::FileUploadCompleted { upload_id, file });
                }
                Err(e) => {
                    handle.send(ServerEvent::FileUploadError {
                        upload_id: Some(upload_id),
                        error: e.code().to_string(),
                    });
                }
            }
        }
    }
}

/// The room this connection is bound to, if any.
fn current_room(state: &AppState, ctx: &ConnectionContext) -> Option<Arc<Room>> {
    ctx.room_code
        .as_deref()
        .and_then(|room_code| state.rooms.lookup(room_code))
}

/// Resolve an event's `roomId` against the connection's binding. A mismatch
/// means the sender is not a participant of the named room: dropped.
fn bound_room(state: &AppState, ctx: &ConnectionContext, room_id: &str) -> Option<Arc<Room>> {
    let canonical = code::canonicalize(room_id);
    if ctx.room_code.as_deref() != Some(canonical.as_str()) {
        debug!(room = %canonical, "Event for unbound room dropped");
        return None;
    }
    state.rooms.lookup(&canonical)
}

async fn handle_join(
    state: &AppState,
    ctx: &mut ConnectionContext,
    handle: &ConnectionHandle,
    room_id: &str,
    nickname: &str,
) {
    let canonical = code::canonicalize(room_id);

    // Joining a different room implicitly leaves the current one.
    if let Some(previous) = ctx.room_code.take() {
        if previous == canonical {
            ctx.room_code = Some(previous);
        } else {
            state.rooms.leave(&previous, handle.conn_id).await;
        }
    }

    match state.rooms.join(&canonical, handle.clone(), nickname).await {
        Ok(view) => {
            ctx.room_code = Some(view.room_id.clone());
            handle.send(ServerEvent::RoomJoined {
                room_id: view.room_id,
                participants: view.participants,
                is_host: view.is_host,
            });
        }
        Err(e) => {
            handle.send(ServerEvent::Error {
                message: e.to_string(),
            });
        }
    }
}

async fn handle_upload_start(
    state: &AppState,
    handle: &ConnectionHandle,
    room_id: &str,
    original_name: &str,
    mime_type: String,
    size: i64,
) {
    let canonical = code::canonicalize(room_id);
    if state.rooms.lookup(&canonical).is_none() {
        handle.send(ServerEvent::FileUploadError {
            upload_id: None,
            error: UploadError::RoomNotFound.code().to_string(),
        });
        return;
    }

    match state
        .uploads
        .start(handle.conn_id, canonical, original_name, mime_type, size)
        .await
    {
        Ok(upload_id) => {
            handle.send(ServerEvent::FileUploadStarted { upload_id });
        }
        Err(e) => {
            handle.send(ServerEvent::FileUploadError {
                upload_id: None,
                error: e.code().to_string(),
            });
        }
    }
}

async fn handle_upload_chunk(
    state: &AppState,
    handle: &ConnectionHandle,
    upload_id: Uuid,
    chunk: &str,
) {
    let data = match base64::engine::general_purpose::STANDARD.decode(chunk) {
        Ok(data) => data,
        Err(e) => {
            debug!(upload = %upload_id, error = %e, "Undecodable chunk dropped");
            return;
        }
    };

    match state.uploads.chunk(handle.conn_id, upload_id, &data).await {
        Ok(received) => {
            handle.send(ServerEvent::FileUploadProgress {
                upload_id,
                received,
            });
        }
        Err(e) => {
            handle.send(ServerEvent::FileUploadError {
                upload_id: Some(upload_id),
                error: e.code().to_string(),
            });
        }
    }
}
