//! Robustness tests for the chat daemon.
//!
//! These tests verify the server stays healthy when clients misbehave:
//! - Malformed (non-UTF-8) frames, during and after the handshake
//! - Empty and very large payloads
//! - Pipelined writes that outrun the server's replies
//! - Abrupt disconnects mid-conversation
//! - Rapid join/leave churn and many concurrent participants

use std::net::SocketAddr;
use std::time::Duration;

use natter_core::ChatMessage;
use natter_protocol::WELCOME;
use natterd::registry::spawn_registry;
use natterd::server::ChatServer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Payload size used to prove frames have no built-in length cap
const HUGE_FRAME_LEN: usize = 1024 * 1024;

// ============================================================================
// Test Helpers
// ============================================================================

struct TestServer {
    addr: SocketAddr,
    cancel_token: CancellationToken,
    server_task: JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let registry = spawn_registry();
        let cancel_token = CancellationToken::new();

        let server = ChatServer::bind("127.0.0.1", 0, registry, cancel_token.clone())
            .await
            .expect("bind test server");
        let addr = server.local_addr().expect("server local addr");

        let server_task = tokio::spawn(server.run());

        TestServer {
            addr,
            cancel_token,
            server_task,
        }
    }

    async fn connect(&self) -> TestClient {
        let stream = TcpStream::connect(self.addr)
            .await
            .expect("connect to server");
        TestClient::new(stream)
    }

    async fn shutdown(self) {
        self.cancel_token.cancel();
        timeout(SHUTDOWN_GRACE_PERIOD, self.server_task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked");
    }
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Sends one NUL-terminated frame.
    async fn send(&mut self, payload: &str) {
        self.writer.write_all(payload.as_bytes()).await.unwrap();
        self.writer.write_all(&[0]).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Sends raw bytes with no framing applied.
    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Receives one frame, panicking on timeout or EOF.
    async fn recv(&mut self) -> String {
        let mut buf = Vec::new();
        let n = timeout(RECV_TIMEOUT, self.reader.read_until(0, &mut buf))
            .await
            .expect("timed out waiting for a frame")
            .expect("read from server");
        assert!(n > 0, "Expected a frame, server closed the connection");
        assert_eq!(buf.pop(), Some(0), "frame arrived without a terminator");
        String::from_utf8(buf).expect("frame payload is not UTF-8")
    }

    /// Consumes the welcome banner and claims `name`, asserting acceptance.
    async fn join(&mut self, name: &str) {
        assert_eq!(self.recv().await, WELCOME);
        self.send(name).await;
        assert_eq!(self.recv().await, "OK");
    }
}

// ============================================================================
// Malformed Frame Tests
// ============================================================================

#[tokio::test]
async fn test_non_utf8_name_frame_rejected() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    assert_eq!(client.recv().await, WELCOME);

    // Undecodable candidate gets FAIL, not a dropped connection.
    client.send_raw(&[0xff, 0xfe, 0]).await;
    assert_eq!(client.recv().await, "FAIL");

    client.send("dave").await;
    assert_eq!(client.recv().await, "OK");

    server.shutdown().await;
}

#[tokio::test]
async fn test_non_utf8_chat_frame_dropped() {
    let server = TestServer::spawn().await;

    let mut alice = server.connect().await;
    alice.join("alice").await;
    let mut bob = server.connect().await;
    bob.join("bob").await;

    // The malformed frame is discarded; the connection keeps working.
    alice.send_raw(&[0xff, 0]).await;
    alice.send("still here").await;

    for client in [&mut alice, &mut bob] {
        let message = ChatMessage::decode(&client.recv().await).expect("decodable broadcast");
        assert_eq!(message.body(), "still here");
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_burst_of_empty_frames_each_rejected() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    assert_eq!(client.recv().await, WELCOME);

    // Five empty name candidates in one TCP segment.
    client.send_raw(&[0, 0, 0, 0, 0]).await;
    for _ in 0..5 {
        assert_eq!(client.recv().await, "FAIL");
    }

    client.send("zed").await;
    assert_eq!(client.recv().await, "OK");

    server.shutdown().await;
}

// ============================================================================
// Payload Shape Tests
// ============================================================================

#[tokio::test]
async fn test_empty_chat_line_broadcast() {
    let server = TestServer::spawn().await;

    let mut alice = server.connect().await;
    alice.join("alice").await;

    alice.send("").await;

    let message = ChatMessage::decode(&alice.recv().await).expect("decodable broadcast");
    assert_eq!(message.author().as_str(), "alice");
    assert_eq!(message.body(), "");

    server.shutdown().await;
}

#[tokio::test]
async fn test_huge_frame_round_trips() {
    let server = TestServer::spawn().await;

    let mut alice = server.connect().await;
    alice.join("alice").await;

    let body = "x".repeat(HUGE_FRAME_LEN);
    alice.send(&body).await;

    let message = ChatMessage::decode(&alice.recv().await).expect("decodable broadcast");
    assert_eq!(message.body(), body);

    server.shutdown().await;
}

#[tokio::test]
async fn test_pipelined_handshake_before_reading_welcome() {
    let server = TestServer::spawn().await;
    let mut client = server.connect().await;

    // Write the name without waiting for the banner; replies still
    // arrive in order: welcome first, then the handshake result.
    client.send("eager").await;
    assert_eq!(client.recv().await, WELCOME);
    assert_eq!(client.recv().await, "OK");

    server.shutdown().await;
}

// ============================================================================
// Churn Tests
// ============================================================================

#[tokio::test]
async fn test_abrupt_disconnect_leaves_room_working() {
    let server = TestServer::spawn().await;

    let mut alice = server.connect().await;
    alice.join("alice").await;
    let mut bob = server.connect().await;
    bob.join("bob").await;
    let mut carol = server.connect().await;
    carol.join("carol").await;

    drop(bob);

    alice.send("anyone still there?").await;

    for client in [&mut alice, &mut carol] {
        let message = ChatMessage::decode(&client.recv().await).expect("decodable broadcast");
        assert_eq!(message.body(), "anyone still there?");
    }

    // New participants can still join.
    let mut dave = server.connect().await;
    dave.join("dave").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_rapid_join_leave_cycles() {
    let server = TestServer::spawn().await;

    for i in 0..20 {
        let mut client = server.connect().await;
        client.join(&format!("rapid-{i}")).await;
        // Drop without saying goodbye.
    }

    let mut final_client = server.connect().await;
    final_client.join("final").await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_many_concurrent_participants_all_receive_broadcasts() {
    let server = TestServer::spawn().await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let addr = server.addr;
        handles.push(tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            let mut client = TestClient::new(stream);
            client.join(&format!("member-{i}")).await;
            client
        }));
    }

    let mut members = Vec::new();
    for handle in handles {
        members.push(handle.await.expect("join task should succeed"));
    }

    // Everyone was registered before the announcer, so everyone hears it.
    let mut announcer = server.connect().await;
    announcer.join("announcer").await;
    announcer.send("all hands").await;

    for member in &mut members {
        let message = ChatMessage::decode(&member.recv().await).expect("decodable broadcast");
        assert_eq!(message.author().as_str(), "announcer");
        assert_eq!(message.body(), "all hands");
    }

    server.shutdown().await;
}
