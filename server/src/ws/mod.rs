//! Connection Dispatcher
//!
//! Accepts duplex WebSocket connections, assigns each a stable connection
//! ID, parses named events, and routes them to the room registry, signaling
//! router, chat log, and upload manager. Teardown cascades: leave the room
//! (with `user-left` fan-out), then abort the connection's uploads.

pub mod connection;
pub mod dispatch;
pub mod events;

pub use connection::{ConnectionContext, ConnectionHandle};
pub use events::{ClientEvent, ServerEvent};

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::api::AppState;

/// WebSocket upgrade handler for `GET /ws`.
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one connection: writer task for the outbound queue, read loop for
/// inbound events, cleanup on any exit path.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::new(conn_id);
    let mut ctx = ConnectionContext::default();

    info!(conn = %conn_id, "WebSocket connected");

    // Drain the outbound queue onto the socket.
    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            () = handle.killed() => {
                debug!(conn = %conn_id, "Dropping slow connection");
                break;
            }
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => {
                                dispatch::handle_event(&state, &mut ctx, &handle, event).await;
                            }
                            Err(e) => {
                                debug!(conn = %conn_id, error = %e, "Malformed event dropped");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(conn = %conn_id, "WebSocket closed");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong are handled by the transport; binary
                        // frames are not part of the protocol.
                    }
                    Some(Err(e)) => {
                        debug!(conn = %conn_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    // Cascading cleanup. Leaving first preserves per-room ordering of the
    // user-left fan-out; upload teardown touches no room state.
    if let Some(room_code) = ctx.room_code.take() {
        state.rooms.leave(&room_code, conn_id).await;
    }
    state.uploads.abort_for_connection(conn_id).await;
    writer.abort();

    info!(conn = %conn_id, "WebSocket disconnected");
}
