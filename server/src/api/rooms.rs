//! Room Creation API
//!
//! Request/response surface for minting and inspecting rooms. This is the
//! only way rooms come into existence; joining an unminted code fails on
//! the event channel.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::AppState;

/// Errors returned by the room REST endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No room with the given code exists.
    #[error("Room not found")]
    RoomNotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::RoomNotFound => StatusCode::NOT_FOUND,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Request body for `POST /api/create-room`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Accepted for wire compatibility; the host is always the first
    /// participant to join.
    #[serde(default)]
    pub host_id: Option<String>,
}

/// Response for `POST /api/create-room`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    /// Canonical room code.
    pub room_id: String,
    /// Always true on the success path.
    pub success: bool,
}

/// Response for `GET /api/room/{id}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfoResponse {
    /// Canonical room code.
    pub room_id: String,
    /// Current number of participants.
    pub participant_count: usize,
    /// Always true on the success path.
    pub exists: bool,
}

/// Mint a new room.
///
/// POST /api/create-room
pub async fn create_room(
    State(state): State<AppState>,
    body: Option<Json<CreateRoomRequest>>,
) -> (StatusCode, Json<CreateRoomResponse>) {
    if let Some(Json(CreateRoomRequest { host_id: Some(host_id) })) = body {
        debug!(host_id = %host_id, "create-room hostId ignored");
    }

    let room_id = state.rooms.mint();
    (
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_id,
            success: true,
        }),
    )
}

/// Inspect a room by code.
///
/// GET /api/room/{id}
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RoomInfoResponse>, ApiError> {
    let room = state.rooms.lookup(&id).ok_or(ApiError::RoomNotFound)?;
    Ok(Json(RoomInfoResponse {
        room_id: room.code.clone(),
        participant_count: room.participant_count().await,
        exists: true,
    }))
}

/// Liveness probe.
///
/// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
