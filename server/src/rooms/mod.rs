//! Room Registry and Participant State
//!
//! Authoritative mapping from room code to the Room aggregate: participants,
//! host, chat log, and the single-sharer flag. All mutations of one room are
//! serialized behind its state lock.

pub mod code;
pub mod error;
pub mod registry;
pub mod room;

pub use error::RoomError;
pub use registry::{JoinedRoom, RoomRegistry};
pub use room::{ConnectionId, Participant, ParticipantSnapshot, Room, RoomState, MAX_PARTICIPANTS};
