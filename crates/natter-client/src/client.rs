//! Connection to the chat server: handshake, then steady-state frames.

use natter_core::ChatMessage;
use natter_protocol::{FrameError, FrameReader, FrameWriter, HandshakeReply};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// A connected chat client, up to and including name negotiation.
///
/// The server speaks first: read the welcome with
/// [`ChatClient::read_welcome`], then claim a name until the server
/// accepts one. After that, [`ChatClient::split`] separates the two
/// stream directions so messages can arrive while the user types.
pub struct ChatClient {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
}

impl ChatClient {
    /// Opens a connection to the configured server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connect` when the server is unreachable.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let addr = config.addr();
        debug!(addr = %addr, "Connecting to chat server");

        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| ClientError::Connect {
                addr,
                error: e.to_string(),
            })?;

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: FrameReader::new(read_half),
            writer: FrameWriter::new(write_half),
        })
    }

    /// Reads the welcome frame the server sends on connect.
    pub async fn read_welcome(&mut self) -> Result<String> {
        Ok(self.reader.read_frame().await?)
    }

    /// Submits a candidate display name and returns the verdict.
    ///
    /// On [`HandshakeReply::Rejected`] the connection stays open for
    /// another attempt with a different name.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnexpectedReply` if the server answers
    /// with anything other than the two handshake verdicts.
    pub async fn claim_name(&mut self, name: &str) -> Result<HandshakeReply> {
        self.writer.write_frame(name).await?;
        let reply = self.reader.read_frame().await?;
        HandshakeReply::from_frame(&reply).ok_or(ClientError::UnexpectedReply(reply))
    }

    /// Splits the connection for concurrent reading and writing.
    #[must_use]
    pub fn split(self) -> (MessageStream, LineSink) {
        (
            MessageStream {
                reader: self.reader,
            },
            LineSink {
                writer: self.writer,
            },
        )
    }
}

/// Receiving half of a split connection.
pub struct MessageStream {
    reader: FrameReader<OwnedReadHalf>,
}

impl MessageStream {
    /// Waits for the next broadcast message.
    ///
    /// Returns `Ok(None)` once the server closes the stream. A frame
    /// that fails to decode is logged and skipped rather than ending
    /// the session.
    pub async fn next_message(&mut self) -> Result<Option<ChatMessage>> {
        loop {
            let frame = match self.reader.read_frame().await {
                Ok(frame) => frame,
                Err(FrameError::Eof) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            match ChatMessage::decode(&frame) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => {
                    warn!(error = %e, frame = %frame, "Skipping undecodable frame");
                }
            }
        }
    }
}

/// Sending half of a split connection.
pub struct LineSink {
    writer: FrameWriter<OwnedWriteHalf>,
}

impl LineSink {
    /// Sends one line of chat text.
    pub async fn send_line(&mut self, body: &str) -> Result<()> {
        Ok(self.writer.write_frame(body).await?)
    }

    /// Flushes and closes the sending direction, telling the server
    /// this client is done.
    pub async fn close(mut self) -> Result<()> {
        Ok(self.writer.shutdown().await?)
    }
}

// ============================================================================
// Tests
// ============================================================================
