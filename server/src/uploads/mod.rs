//! Upload Manager
//!
//! Chunked ingestion of untrusted binary uploads to local storage: session
//! lifecycle, quota enforcement, and disconnect cleanup. Completed files are
//! served back at `/uploads/<stored-name>`; the manager itself never
//! broadcasts anything — sharing happens through the chat log.

mod error;
mod manager;

pub use error::UploadError;
pub use manager::{FileMeta, UploadManager};
