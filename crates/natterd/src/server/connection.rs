//! Per-connection handling: handshake, then the read/broadcast loop.

use std::time::Duration;

use natter_core::{ChatMessage, Username};
use natter_protocol::{FrameError, FrameReader, FrameWriter, HandshakeReply, WELCOME};
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{RegistryError, RegistryHandle, Session, OUTBOUND_QUEUE_CAPACITY};

/// Timeout for a single frame write to a client.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that end a connection early.
///
/// A clean disconnect is not represented here: end-of-stream and
/// shutdown both complete the handler normally.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("transport failed: {0}")]
    Transport(#[from] FrameError),

    #[error("registry unavailable: {0}")]
    Registry(#[from] RegistryError),

    /// The writer task stopped, so nothing can reach the peer anymore.
    #[error("outbound queue closed")]
    OutboundClosed,
}

/// Handles a single client connection through its whole life:
/// welcome frame, name negotiation, then the read/broadcast loop.
///
/// The socket's write half lives in a separate writer task fed by a
/// bounded queue. The handler and the registry both queue frames; only
/// the writer task touches the socket, so frame order on the wire is
/// the queue order.
pub struct ConnectionHandler {
    reader: FrameReader<OwnedReadHalf>,
    outbound: mpsc::Sender<String>,
    writer_task: JoinHandle<()>,
    registry: RegistryHandle,
    cancel_token: CancellationToken,
    connection_number: u64,
}

impl ConnectionHandler {
    /// Splits the stream and spawns the writer task for its write half.
    pub fn new(
        stream: TcpStream,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
        connection_number: u64,
    ) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let writer_task = tokio::spawn(write_frames(
            FrameWriter::new(write_half),
            outbound_rx,
            connection_number,
        ));

        Self {
            reader: FrameReader::new(read_half),
            outbound: outbound_tx,
            writer_task,
            registry,
            cancel_token,
            connection_number,
        }
    }

    /// Runs the connection to completion and tears it down.
    pub async fn run(mut self) {
        let connection_number = self.connection_number;
        info!(connection = connection_number, "Client connected");

        match self.serve().await {
            Ok(()) => {
                info!(connection = connection_number, "Client disconnected");
            }
            Err(ConnectionError::Transport(FrameError::Eof)) => {
                info!(connection = connection_number, "Client disconnected");
            }
            Err(ConnectionError::Transport(e)) => {
                warn!(connection = connection_number, error = %e, "Connection failed");
            }
            Err(ConnectionError::Registry(e)) => {
                debug!(
                    connection = connection_number,
                    error = %e,
                    "Registry unavailable, dropping connection"
                );
            }
            Err(ConnectionError::OutboundClosed) => {
                debug!(
                    connection = connection_number,
                    "Writer task stopped, dropping connection"
                );
            }
        }

        // Drop our sender so the writer drains and exits. The
        // registry's clone is already gone: the session was
        // unregistered, dropped at registry shutdown, or never
        // admitted.
        let Self {
            outbound,
            writer_task,
            ..
        } = self;
        drop(outbound);
        if let Err(e) = writer_task.await {
            debug!(connection = connection_number, error = %e, "Writer task ended abnormally");
        }
    }

    async fn serve(&mut self) -> Result<(), ConnectionError> {
        self.queue_frame(WELCOME).await?;

        let Some(name) = self.handshake().await? else {
            // Shutdown hit before the client claimed a name.
            return Ok(());
        };

        let result = self.read_loop(&name).await;

        if let Err(e) = self.registry.unregister(name).await {
            debug!(
                connection = self.connection_number,
                error = %e,
                "Unregister skipped, registry gone"
            );
        }

        result
    }

    /// Negotiates a unique name with the client.
    ///
    /// Each rejected candidate gets a `"FAIL"` frame and another read;
    /// the loop only ends with a registered name, a shutdown request
    /// (`Ok(None)`), or a dead connection.
    async fn handshake(&mut self) -> Result<Option<Username>, ConnectionError> {
        loop {
            let raw = match self.next_frame().await {
                Ok(Some(raw)) => raw,
                Ok(None) => return Ok(None),
                Err(FrameError::InvalidUtf8(_)) => {
                    // Not a usable name; same answer as any other bad candidate.
                    self.reject().await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let name = match Username::parse(raw) {
                Ok(name) => name,
                Err(e) => {
                    debug!(
                        connection = self.connection_number,
                        error = %e,
                        "Rejected malformed name"
                    );
                    self.reject().await?;
                    continue;
                }
            };

            if self.registry.validate(name.clone()).await? {
                debug!(
                    connection = self.connection_number,
                    name = %name,
                    "Name taken, rejecting"
                );
                self.reject().await?;
                continue;
            }

            let session = Session::new(name.clone(), self.outbound.clone());
            match self.registry.register(session).await {
                // The registry queued the "OK" frame in the same turn.
                Ok(()) => {
                    info!(
                        connection = self.connection_number,
                        name = %name,
                        "Handshake complete"
                    );
                    return Ok(Some(name));
                }
                Err(RegistryError::NameTaken(_)) => {
                    // Lost the race against a concurrent handshake that
                    // validated the same name.
                    debug!(
                        connection = self.connection_number,
                        name = %name,
                        "Name taken at registration, rejecting"
                    );
                    self.reject().await?;
                }
                Err(RegistryError::SessionUnreachable(_)) => {
                    return Err(ConnectionError::OutboundClosed);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Steady state: every inbound frame becomes a timestamped message
    /// submitted for broadcast.
    async fn read_loop(&mut self, name: &Username) -> Result<(), ConnectionError> {
        loop {
            match self.next_frame().await {
                Ok(Some(body)) => {
                    let message = ChatMessage::now(name.clone(), body);
                    self.registry.broadcast(message).await?;
                }
                Ok(None) => {
                    debug!(
                        connection = self.connection_number,
                        "Shutdown requested, closing connection"
                    );
                    return Ok(());
                }
                Err(FrameError::Eof) => {
                    debug!(connection = self.connection_number, "Client closed the stream");
                    return Ok(());
                }
                Err(FrameError::InvalidUtf8(e)) => {
                    // Malformed frame; drop it and keep reading.
                    warn!(
                        connection = self.connection_number,
                        error = %e,
                        "Dropping malformed frame"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Reads the next frame, or `None` once shutdown is requested.
    async fn next_frame(&mut self) -> Result<Option<String>, FrameError> {
        tokio::select! {
            _ = self.cancel_token.cancelled() => Ok(None),
            result = self.reader.read_frame() => result.map(Some),
        }
    }

    async fn reject(&self) -> Result<(), ConnectionError> {
        self.queue_frame(HandshakeReply::Rejected.as_frame()).await
    }

    async fn queue_frame(&self, frame: &str) -> Result<(), ConnectionError> {
        self.outbound
            .send(frame.to_string())
            .await
            .map_err(|_| ConnectionError::OutboundClosed)
    }
}

/// Drains the outbound queue into the socket until the queue closes
/// or a write fails.
///
/// Every sender dropping ends the loop cleanly; a failed or stalled
/// write ends it early, which surfaces to senders as a closed queue.
async fn write_frames<W>(
    mut writer: FrameWriter<W>,
    mut outbound: mpsc::Receiver<String>,
    connection_number: u64,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = outbound.recv().await {
        match timeout(WRITE_TIMEOUT, writer.write_frame(&frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(connection = connection_number, error = %e, "Write failed, closing outbound");
                break;
            }
            Err(_) => {
                warn!(connection = connection_number, "Write timed out, closing outbound");
                break;
            }
        }
    }

    let _ = writer.shutdown().await;
}

// ============================================================================
// Tests
// ============================================================================
