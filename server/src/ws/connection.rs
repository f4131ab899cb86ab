//! Per-connection outbound queue and context.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tracing::warn;

use super::events::ServerEvent;
use crate::rooms::ConnectionId;

/// Outbound queue depth per connection. A connection that falls this far
/// behind is dropped rather than allowed to stall senders.
const OUTBOUND_BUFFER: usize = 256;

/// Handle for delivering events to one connection.
///
/// Delivery never blocks: events go through a bounded queue drained by the
/// connection's writer task. Overflow kills the connection, which triggers
/// its normal cascading cleanup.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Connection ID of the socket behind this handle.
    pub conn_id: ConnectionId,
    tx: mpsc::Sender<ServerEvent>,
    kill: Arc<Notify>,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end for the writer task.
    #[must_use]
    pub fn new(conn_id: ConnectionId) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        (
            Self {
                conn_id,
                tx,
                kill: Arc::new(Notify::new()),
            },
            rx,
        )
    }

    /// Enqueue an event for delivery. Returns false when the event was not
    /// queued (connection gone or queue full).
    pub fn send(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(conn = %self.conn_id, "Outbound queue full, dropping connection");
                self.kill.notify_one();
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Resolves when the connection has been marked for termination.
    pub async fn killed(&self) {
        self.kill.notified().await;
    }
}

/// Mutable per-connection context owned by the socket task.
#[derive(Debug, Default)]
pub struct ConnectionContext {
    /// Canonical code of the room this connection is bound to, once joined.
    pub room_code: Option<String>,
}
