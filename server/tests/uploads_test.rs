//! Chunked upload integration tests: the three-event protocol, quotas,
//! authorization, disconnect cleanup, and re-sharing through chat.
//!
//! Run with: `cargo test --test uploads_test`

mod helpers;

use base64::Engine;
use helpers::{wait_until, TestServer};
use serde_json::{json, Value};

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Deterministic payload for content comparisons.
fn pattern_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_chunked_upload_end_to_end() {
    let server = TestServer::spawn().await;
    let code = server.create_room().await;

    let mut alice = server.connect().await;
    alice.join(&code, "alice").await;

    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "slides.pdf",
            "mimeType": "application/pdf",
            "size": 200_000
        }))
        .await;
    let started = alice.recv_type("file-upload-started").await;
    let upload_id = started["uploadId"].as_str().unwrap().to_string();

    let payload = pattern_bytes(200_000);
    let mut expected_received = 0u64;
    for chunk in payload.chunks(64 * 1024) {
        alice
            .send(json!({
                "type": "file-upload-chunk",
                "uploadId": upload_id,
                "chunk": b64(chunk)
            }))
            .await;
        expected_received += chunk.len() as u64;
        let ack = alice.recv_type("file-upload-progress").await;
        assert_eq!(ack["uploadId"].as_str().unwrap(), upload_id);
        assert_eq!(ack["received"].as_u64().unwrap(), expected_received);
    }
    assert_eq!(expected_received, 200_000);

    alice
        .send(json!({"type": "file-upload-complete", "uploadId": upload_id}))
        .await;
    let completed = alice.recv_type("file-upload-completed").await;
    let file = &completed["file"];
    assert_eq!(file["size"], 200_000);
    assert_eq!(file["originalName"], "slides.pdf");
    assert_eq!(file["mimeType"], "application/pdf");
    let url = file["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/slides-"));
    assert!(url.ends_with(".pdf"));

    // The URL resolves to exactly the uploaded bytes.
    let res = server.http.get(server.http_url(url)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body = res.bytes().await.unwrap();
    assert_eq!(body.as_ref(), payload.as_slice());

    assert_eq!(server.state.uploads.session_count(), 0);
}

#[tokio::test]
async fn test_exceeding_declared_size_aborts_session() {
    let server = TestServer::spawn().await;
    let code = server.create_room().await;

    let mut alice = server.connect().await;
    alice.join(&code, "alice").await;

    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "small.bin",
            "mimeType": "application/octet-stream",
            "size": 1000
        }))
        .await;
    let started = alice.recv_type("file-upload-started").await;
    let upload_id = started["uploadId"].as_str().unwrap().to_string();

    let chunk = b64(&[0u8; 400]);
    for expected in [400, 800] {
        alice
            .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": chunk}))
            .await;
        let ack = alice.recv_type("file-upload-progress").await;
        assert_eq!(ack["received"], expected);
    }

    alice
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": chunk}))
        .await;
    let err = alice.recv_type("file-upload-error").await;
    assert_eq!(err["uploadId"].as_str().unwrap(), upload_id);
    assert_eq!(err["error"], "FileExceeded");

    // The partial file is gone and the session is dead.
    assert!(server.stored_files().await.is_empty());
    alice
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": chunk}))
        .await;
    let err = alice.recv_type("file-upload-error").await;
    assert_eq!(err["error"], "UnknownUpload");
}

#[tokio::test]
async fn test_upload_start_validation() {
    let server = TestServer::spawn().await;
    let code = server.create_room().await;

    let mut alice = server.connect().await;
    alice.join(&code, "alice").await;

    // Unknown room.
    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": "ZZZZZZZZ",
            "originalName": "a.bin",
            "mimeType": "application/octet-stream",
            "size": 10
        }))
        .await;
    let err = alice.recv_type("file-upload-error").await;
    assert_eq!(err["error"], "RoomNotFound");
    assert!(err.get("uploadId").is_none());

    // Non-positive size.
    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "a.bin",
            "mimeType": "application/octet-stream",
            "size": 0
        }))
        .await;
    let err = alice.recv_type("file-upload-error").await;
    assert_eq!(err["error"], "InvalidSize");

    // Over the 25 MiB cap.
    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "a.bin",
            "mimeType": "application/octet-stream",
            "size": 26 * 1024 * 1024
        }))
        .await;
    let err = alice.recv_type("file-upload-error").await;
    assert_eq!(err["error"], "FileTooLarge");

    assert_eq!(server.state.uploads.session_count(), 0);
}

#[tokio::test]
async fn test_upload_owned_by_originating_connection() {
    let server = TestServer::spawn().await;
    let code = server.create_room().await;

    let mut alice = server.connect().await;
    alice.join(&code, "alice").await;
    let mut mallory = server.connect().await;

    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "secret.bin",
            "mimeType": "application/octet-stream",
            "size": 10
        }))
        .await;
    let started = alice.recv_type("file-upload-started").await;
    let upload_id = started["uploadId"].as_str().unwrap().to_string();

    // A foreign connection cannot write into or finalize the session.
    mallory
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": b64(b"evil")}))
        .await;
    let err = mallory.recv_type("file-upload-error").await;
    assert_eq!(err["error"], "UnknownUpload");

    mallory
        .send(json!({"type": "file-upload-complete", "uploadId": upload_id}))
        .await;
    let err = mallory.recv_type("file-upload-error").await;
    assert_eq!(err["error"], "UnknownUpload");

    // The owner is unaffected.
    alice
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": b64(b"0123456789")}))
        .await;
    let ack = alice.recv_type("file-upload-progress").await;
    assert_eq!(ack["received"], 10);
}

#[tokio::test]
async fn test_empty_chunk_rejected_session_survives() {
    let server = TestServer::spawn().await;
    let code = server.create_room().await;

    let mut alice = server.connect().await;
    alice.join(&code, "alice").await;

    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "a.txt",
            "mimeType": "text/plain",
            "size": 5
        }))
        .await;
    let started = alice.recv_type("file-upload-started").await;
    let upload_id = started["uploadId"].as_str().unwrap().to_string();

    alice
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": ""}))
        .await;
    let err = alice.recv_type("file-upload-error").await;
    assert_eq!(err["error"], "EmptyChunk");

    alice
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": b64(b"hello")}))
        .await;
    let ack = alice.recv_type("file-upload-progress").await;
    assert_eq!(ack["received"], 5);
}

#[tokio::test]
async fn test_short_upload_completes_at_actual_size() {
    let server = TestServer::spawn().await;
    let code = server.create_room().await;

    let mut alice = server.connect().await;
    alice.join(&code, "alice").await;

    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "short.bin",
            "mimeType": "application/octet-stream",
            "size": 1000
        }))
        .await;
    let started = alice.recv_type("file-upload-started").await;
    let upload_id = started["uploadId"].as_str().unwrap().to_string();

    alice
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": b64(b"abc")}))
        .await;
    alice.recv_type("file-upload-progress").await;

    alice
        .send(json!({"type": "file-upload-complete", "uploadId": upload_id}))
        .await;
    let completed = alice.recv_type("file-upload-completed").await;
    assert_eq!(completed["file"]["size"], 3);
}

#[tokio::test]
async fn test_disconnect_aborts_inflight_uploads() {
    let server = TestServer::spawn().await;
    let code = server.create_room().await;

    let mut alice = server.connect().await;
    alice.join(&code, "alice").await;
    let mut bob = server.connect().await;
    bob.join(&code, "bob").await;
    alice.recv_type("user-joined").await;

    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "doomed.bin",
            "mimeType": "application/octet-stream",
            "size": 100_000
        }))
        .await;
    let started = alice.recv_type("file-upload-started").await;
    let upload_id = started["uploadId"].as_str().unwrap().to_string();

    alice
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": b64(&[7u8; 1024])}))
        .await;
    alice.recv_type("file-upload-progress").await;
    assert_eq!(server.state.uploads.session_count(), 1);

    alice.close().await;
    bob.recv_type("user-left").await;

    let state = server.state.clone();
    wait_until(
        move || state.uploads.session_count() == 0,
        "upload session aborted on disconnect",
    )
    .await;
    assert!(
        server.stored_files().await.is_empty(),
        "no orphan partial files may remain"
    );
}

#[tokio::test]
async fn test_completed_upload_shared_through_chat() {
    let server = TestServer::spawn().await;
    let code = server.create_room().await;

    let mut alice = server.connect().await;
    alice.join(&code, "alice").await;
    let mut bob = server.connect().await;
    bob.join(&code, "bob").await;
    alice.recv_type("user-joined").await;

    alice
        .send(json!({
            "type": "file-upload-start",
            "roomId": code,
            "originalName": "notes.txt",
            "mimeType": "text/plain",
            "size": 11
        }))
        .await;
    let started = alice.recv_type("file-upload-started").await;
    let upload_id = started["uploadId"].as_str().unwrap().to_string();

    alice
        .send(json!({"type": "file-upload-chunk", "uploadId": upload_id, "chunk": b64(b"hello world")}))
        .await;
    alice.recv_type("file-upload-progress").await;
    alice
        .send(json!({"type": "file-upload-complete", "uploadId": upload_id}))
        .await;
    let completed = alice.recv_type("file-upload-completed").await;
    let file: Value = completed["file"].clone();

    // The upload itself broadcast nothing; sharing happens via chat.
    alice
        .send(json!({"type": "chat-message", "message": "here you go", "file": file}))
        .await;

    for client in [&mut alice, &mut bob] {
        let event = client.recv_type("chat-message").await;
        assert_eq!(event["message"], "here you go");
        assert_eq!(event["file"]["originalName"], "notes.txt");
        assert_eq!(event["file"]["size"], 11);
        let url = event["file"]["url"].as_str().unwrap();
        let res = server.http.get(server.http_url(url)).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "hello world");
    }
}
