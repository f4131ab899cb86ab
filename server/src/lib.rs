//! `meet-server`
//!
//! Signaling and fan-out backend for browser WebRTC meetings: room registry,
//! participant state, offer/answer relay for camera and screen sessions,
//! per-room chat, and chunked file uploads. Media flows peer-to-peer and
//! never transits this server.

pub mod api;
pub mod chat;
pub mod config;
pub mod rooms;
pub mod signaling;
pub mod uploads;
pub mod util;
pub mod ws;
