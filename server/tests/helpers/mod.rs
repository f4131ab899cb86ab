//! Shared helpers for integration tests.
//!
//! Boots the real server (router + listener) on an ephemeral port and
//! provides a thin WebSocket client for driving the event channel.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use meet_server::api::{self, AppState};
use meet_server::config::Config;

/// How long to wait for an expected event before failing the test.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A running server instance backed by a temporary uploads directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    pub state: AppState,
    uploads_dir: tempfile::TempDir,
}

impl TestServer {
    /// Boot the server on an ephemeral localhost port.
    pub async fn spawn() -> Self {
        let uploads_dir = tempfile::tempdir().expect("Failed to create tempdir");
        let mut config = Config::default_for_test();
        config.uploads_dir = uploads_dir.path().to_path_buf();

        let state = AppState::new(config);
        state.uploads.init().await.expect("Failed to init uploads dir");

        let app = api::create_router(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to read local addr");

        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Self {
            addr,
            http: reqwest::Client::new(),
            state,
            uploads_dir,
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.uploads_dir.path().to_path_buf()
    }

    /// Files currently present in the uploads directory.
    pub async fn stored_files(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(self.uploads_path())
            .await
            .expect("Failed to read uploads dir");
        while let Some(entry) = entries.next_entry().await.expect("read_dir entry") {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names
    }

    /// Mint a room over the REST API and return its code.
    pub async fn create_room(&self) -> String {
        let res = self
            .http
            .post(self.http_url("/api/create-room"))
            .send()
            .await
            .expect("create-room request failed");
        assert!(res.status().is_success());
        let body: Value = res.json().await.expect("create-room body");
        assert_eq!(body["success"], true);
        body["roomId"].as_str().expect("roomId").to_string()
    }

    /// Open a WebSocket connection to the event channel.
    pub async fn connect(&self) -> WsClient {
        let url = format!("ws://{}/ws", self.addr);
        let (stream, _) = connect_async(&url).await.expect("WebSocket connect failed");
        WsClient { stream }
    }
}

/// One client connection on the event channel.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send a raw JSON event.
    pub async fn send(&mut self, event: Value) {
        self.stream
            .send(Message::Text(event.to_string().into()))
            .await
            .expect("WebSocket send failed");
    }

    /// Receive the next JSON event, skipping transport frames.
    pub async fn recv(&mut self) -> Value {
        tokio::time::timeout(RECV_TIMEOUT, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return serde_json::from_str(&text).expect("event is valid JSON");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => panic!("WebSocket error: {e}"),
                    None => panic!("WebSocket closed while waiting for event"),
                }
            }
        })
        .await
        .expect("Timed out waiting for event")
    }

    /// Receive the next event and assert its type.
    pub async fn recv_type(&mut self, event_type: &str) -> Value {
        let event = self.recv().await;
        assert_eq!(event["type"], event_type, "unexpected event: {event}");
        event
    }

    /// Assert that no event arrives within a short window.
    pub async fn expect_silence(&mut self, window: Duration) {
        let got = tokio::time::timeout(window, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return serde_json::from_str::<Value>(&text).expect("valid JSON");
                    }
                    Some(Ok(_)) => {}
                    _ => std::future::pending::<()>().await,
                }
            }
        })
        .await;
        assert!(got.is_err(), "expected silence, got: {:?}", got.unwrap());
    }

    /// Join a room and return the `room-joined` view (panics on `error`).
    pub async fn join(&mut self, room_id: &str, nickname: &str) -> Value {
        self.send(json!({"type": "join-room", "roomId": room_id, "nickname": nickname}))
            .await;
        self.recv_type("room-joined").await
    }

    /// Join a room expecting a rejection; returns the error message.
    pub async fn join_expecting_error(&mut self, room_id: &str, nickname: &str) -> String {
        self.send(json!({"type": "join-room", "roomId": room_id, "nickname": nickname}))
            .await;
        let event = self.recv_type("error").await;
        event["message"].as_str().expect("error message").to_string()
    }

    /// Close the connection.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Poll until `predicate` holds or the timeout elapses. Used for cleanup
/// paths that run after the transport notices a disconnect.
pub async fn wait_until<F>(mut predicate: F, what: &str)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while !predicate() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for: {what}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
