//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

/// Default listen port.
const DEFAULT_PORT: u16 = 3001;

/// Default maximum upload size: 25 MiB.
const DEFAULT_MAX_UPLOAD_SIZE: u64 = 25 * 1024 * 1024;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:3001")
    pub bind_address: String,

    /// Allowed cross-origin for browser clients (None = allow any, dev mode)
    pub client_origin: Option<String>,

    /// Directory where uploaded files are stored
    pub uploads_dir: PathBuf,

    /// Maximum file upload size in bytes (default: 25 MiB)
    pub max_upload_size: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            bind_address: format!("0.0.0.0:{port}"),
            client_origin: env::var("CLIENT_ORIGIN").ok().filter(|v| !v.is_empty()),
            uploads_dir: env::var("UPLOADS_DIR")
                .map_or_else(|_| PathBuf::from("./uploads"), PathBuf::from),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
        })
    }

    /// Create a default configuration for testing.
    ///
    /// Binds to an ephemeral localhost port and keeps the 25 MiB cap;
    /// tests point `uploads_dir` at a tempdir.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:0".into(),
            client_origin: None,
            uploads_dir: PathBuf::from("./uploads"),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}
