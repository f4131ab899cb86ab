//! Room Registry Errors

use thiserror::Error;

/// Errors that can occur when joining or resolving a room.
///
/// Display strings are part of the wire contract: join failures are sent to
/// the client verbatim in an `error` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoomError {
    /// No room with the given code exists.
    #[error("Room not found")]
    RoomNotFound,

    /// The room is at capacity.
    #[error("Room is full")]
    RoomFull,

    /// Another participant already uses this nickname.
    #[error("Nickname already taken")]
    NicknameTaken,

    /// Nickname is empty, too long, or contains control characters.
    #[error("Invalid nickname")]
    InvalidNickname,
}
