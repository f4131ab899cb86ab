//! API Router and Application State
//!
//! Central routing configuration and shared state.

pub mod rooms;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::rooms::RoomRegistry;
use crate::uploads::UploadManager;
use crate::ws;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Room registry
    pub rooms: Arc<RoomRegistry>,
    /// Upload session table
    pub uploads: Arc<UploadManager>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let uploads = UploadManager::new(config.uploads_dir.clone(), config.max_upload_size);
        Self {
            config: Arc::new(config),
            rooms: Arc::new(RoomRegistry::new()),
            uploads: Arc::new(uploads),
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Single allowed origin when configured, permissive otherwise (dev mode).
    let cors = match state.config.client_origin.as_ref() {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new()
                .allow_origin([origin])
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
            Err(_) => {
                tracing::warn!(origin = %origin, "Invalid CLIENT_ORIGIN, falling back to permissive CORS");
                permissive_cors()
            }
        },
        None => permissive_cors(),
    };

    Router::new()
        .route("/api/create-room", post(rooms::create_room))
        .route("/api/room/{id}", get(rooms::get_room))
        .route("/api/health", get(rooms::health))
        .route("/ws", get(ws::handler))
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
