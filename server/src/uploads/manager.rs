//! Upload session table and chunk ingestion.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::UploadError;
use crate::rooms::ConnectionId;
use crate::util::human_size;

/// Metadata of a completed upload, shared via chat messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    /// Upload ID.
    pub id: Uuid,
    /// Server-relative URL the stored file is served at.
    pub url: String,
    /// Filename as supplied by the client. Untrusted; never used as a path.
    pub original_name: String,
    /// MIME type as supplied by the client. Untrusted pass-through.
    pub mime_type: String,
    /// Final size in bytes.
    pub size: u64,
    /// Completion time.
    pub uploaded_at: DateTime<Utc>,
}

/// One in-flight upload. `owner` is readable without the lock so disconnect
/// cleanup can find a connection's sessions cheaply.
struct SessionEntry {
    id: Uuid,
    owner: ConnectionId,
    inner: Mutex<UploadSession>,
}

struct UploadSession {
    room_code: String,
    original_name: String,
    mime_type: String,
    declared_size: u64,
    received: u64,
    stored_name: String,
    path: PathBuf,
    /// Open write handle; `None` once the session is finalized or aborted.
    file: Option<File>,
    closed: bool,
}

/// Table of in-flight upload sessions writing to a local directory.
///
/// Chunk writes lock only their own session; room state is never touched.
pub struct UploadManager {
    dir: PathBuf,
    max_size: u64,
    sessions: DashMap<Uuid, Arc<SessionEntry>>,
}

impl UploadManager {
    /// Create a manager writing into `dir`, capping uploads at `max_size`
    /// bytes.
    #[must_use]
    pub fn new(dir: PathBuf, max_size: u64) -> Self {
        Self {
            dir,
            max_size,
            sessions: DashMap::new(),
        }
    }

    /// Create the uploads directory if it does not exist.
    pub async fn init(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Number of in-flight sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Begin a new upload session owned by `conn_id`.
    pub async fn start(
        &self,
        conn_id: ConnectionId,
        room_code: String,
        original_name: &str,
        mime_type: String,
        declared_size: i64,
    ) -> Result<Uuid, UploadError> {
        if declared_size <= 0 {
            return Err(UploadError::InvalidSize);
        }
        let declared_size = declared_size as u64;
        if declared_size > self.max_size {
            return Err(UploadError::FileTooLarge);
        }

        let stored_name = storage_name(original_name);
        let path = self.dir.join(&stored_name);

        // create_new keeps the write handle exclusive to this session.
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                warn!(path = %path.display(), error = %e, "Failed to open upload file");
                UploadError::Storage(e.to_string())
            })?;

        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            Arc::new(SessionEntry {
                id,
                owner: conn_id,
                inner: Mutex::new(UploadSession {
                    room_code,
                    original_name: original_name.to_string(),
                    mime_type,
                    declared_size,
                    received: 0,
                    stored_name,
                    path,
                    file: Some(file),
                    closed: false,
                }),
            }),
        );

        info!(
            upload = %id,
            conn = %conn_id,
            size = declared_size,
            "Upload session started"
        );
        Ok(id)
    }

    /// Append a chunk. Returns the cumulative byte count on success.
    pub async fn chunk(
        &self,
        conn_id: ConnectionId,
        upload_id: Uuid,
        data: &[u8],
    ) -> Result<u64, UploadError> {
        let entry = self.entry_for(conn_id, upload_id)?;
        let mut session = entry.inner.lock().await;

        if session.closed {
            return Err(UploadError::Closed);
        }
        if data.is_empty() {
            return Err(UploadError::EmptyChunk);
        }

        let next = session.received + data.len() as u64;
        if next > session.declared_size || next > self.max_size {
            self.abort(&entry, &mut session).await;
            return Err(UploadError::FileExceeded);
        }

        let file = session.file.as_mut().ok_or(UploadError::Closed)?;
        if let Err(e) = file.write_all(data).await {
            warn!(upload = %upload_id, error = %e, "Chunk write failed");
            self.abort(&entry, &mut session).await;
            return Err(UploadError::WriteFailed);
        }

        session.received = next;
        Ok(next)
    }

    /// Finalize an upload: flush and close the file, return its metadata,
    /// and drop the session.
    ///
    /// Received bytes may be short of the declared size; the file is
    /// accepted at its actual length.
    pub async fn complete(
        &self,
        conn_id: ConnectionId,
        upload_id: Uuid,
    ) -> Result<FileMeta, UploadError> {
        let entry = self.entry_for(conn_id, upload_id)?;
        let mut session = entry.inner.lock().await;

        if session.closed {
            return Err(UploadError::Closed);
        }
        session.closed = true;

        let mut file = session.file.take().ok_or(UploadError::Closed)?;
        if let Err(e) = async {
            file.flush().await?;
            file.sync_all().await
        }
        .await
        {
            warn!(upload = %upload_id, error = %e, "Failed to finalize upload file");
            self.abort(&entry, &mut session).await;
            return Err(UploadError::WriteFailed);
        }
        drop(file);

        let meta = FileMeta {
            id: upload_id,
            url: format!("/uploads/{}", session.stored_name),
            original_name: session.original_name.clone(),
            mime_type: session.mime_type.clone(),
            size: session.received,
            uploaded_at: Utc::now(),
        };
        self.sessions.remove(&upload_id);

        info!(
            upload = %upload_id,
            room = %session.room_code,
            stored = %session.stored_name,
            size = %human_size(session.received),
            "Upload completed"
        );
        Ok(meta)
    }

    /// Abort every session owned by a disconnecting connection, deleting
    /// partial files.
    pub async fn abort_for_connection(&self, conn_id: ConnectionId) {
        let owned: Vec<Arc<SessionEntry>> = self
            .sessions
            .iter()
            .filter(|e| e.value().owner == conn_id)
            .map(|e| Arc::clone(e.value()))
            .collect();

        for entry in owned {
            let mut session = entry.inner.lock().await;
            info!(upload = %entry.id, conn = %conn_id, "Aborting upload on disconnect");
            self.abort(&entry, &mut session).await;
        }
    }

    /// Look up a session and enforce ownership. A foreign owner is
    /// indistinguishable from an unknown ID on the wire.
    fn entry_for(
        &self,
        conn_id: ConnectionId,
        upload_id: Uuid,
    ) -> Result<Arc<SessionEntry>, UploadError> {
        let entry = self
            .sessions
            .get(&upload_id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(UploadError::UnknownUpload)?;
        if entry.owner != conn_id {
            return Err(UploadError::UnknownUpload);
        }
        Ok(entry)
    }

    /// Tear down a session: close the handle, drop the table entry, delete
    /// the partial file.
    async fn abort(&self, entry: &SessionEntry, session: &mut UploadSession) {
        session.closed = true;
        session.file = None;
        self.sessions.remove(&entry.id);
        if let Err(e) = tokio::fs::remove_file(&session.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %session.path.display(), error = %e, "Failed to remove partial upload");
            }
        }
    }
}

/// Build a collision-resistant storage name from an untrusted client
/// filename: sanitized basename, millisecond timestamp, random decimal
/// suffix, original extension.
fn storage_name(original: &str) -> String {
    let (stem, ext) = sanitize_basename(original);
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{stem}-{millis}-{suffix}{ext}")
}

/// Reduce a client-supplied filename to a safe (stem, extension) pair:
/// directory components and parent references are stripped, the charset is
/// limited to alphanumerics plus `.`, `-`, `_`.
fn sanitize_basename(original: &str) -> (String, String) {
    let name: String = std::path::Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .take(128)
        .collect();

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem.trim_matches('.').to_string(), format!(".{ext}"))
        }
        _ => (name.trim_matches('.').to_string(), String::new()),
    };

    if stem.is_empty() {
        ("file".to_string(), ext)
    } else {
        (stem, ext)
    }
}
