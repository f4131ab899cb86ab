//! Upload Errors

use thiserror::Error;

/// Errors that can occur during chunked upload operations.
///
/// [`code`](Self::code) is the stable string clients branch on in
/// `file-upload-error` events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The target room does not exist.
    #[error("Room not found")]
    RoomNotFound,

    /// Declared size is zero or negative.
    #[error("Size must be a positive integer")]
    InvalidSize,

    /// Declared size exceeds the upload cap.
    #[error("File exceeds the maximum upload size")]
    FileTooLarge,

    /// Unknown upload ID, or the session belongs to another connection.
    #[error("Unknown upload")]
    UnknownUpload,

    /// The session has already been completed.
    #[error("Upload already completed")]
    Closed,

    /// Chunk payload was empty.
    #[error("Empty chunk")]
    EmptyChunk,

    /// Cumulative bytes overran the declared size or the cap; the session
    /// was aborted and the partial file deleted.
    #[error("File exceeded declared size")]
    FileExceeded,

    /// Disk write failed; the session was aborted and the partial file
    /// deleted.
    #[error("Write failed")]
    WriteFailed,

    /// Storage failure opening the session's backing file; no session was
    /// created.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl UploadError {
    /// Stable wire code for `file-upload-error` events.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound => "RoomNotFound",
            Self::InvalidSize => "InvalidSize",
            Self::FileTooLarge => "FileTooLarge",
            Self::UnknownUpload => "UnknownUpload",
            Self::Closed => "Closed",
            Self::EmptyChunk => "EmptyChunk",
            Self::FileExceeded => "FileExceeded",
            Self::WriteFailed => "WriteFailed",
            Self::Storage(_) => "Storage",
        }
    }
}
