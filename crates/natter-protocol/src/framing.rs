//! Sentinel-delimited frame transport.
//!
//! A frame is an arbitrary UTF-8 payload terminated by a single NUL byte.
//! Reading consumes bytes up to and including the first sentinel and yields
//! the payload with the sentinel stripped; writing appends the sentinel and
//! flushes immediately so the peer observes the frame without buffering
//! delay. There is no maximum frame size and no escaping: a payload must not
//! contain the sentinel byte, and producing one is a caller error the
//! transport does not detect.

use std::string::FromUtf8Error;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

/// Frame delimiter. Terminates every frame; never appears inside a payload.
pub const SENTINEL: u8 = 0;

/// Errors that can occur on the frame transport.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Peer closed the stream between frames
    #[error("connection closed")]
    Eof,

    /// Stream ended in the middle of a frame
    #[error("stream ended mid-frame after {len} bytes")]
    Truncated { len: usize },

    /// Frame payload is not valid UTF-8
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// Underlying transport failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Buffered reading side of a framed connection.
pub struct FrameReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Reads the next frame, blocking until a sentinel arrives.
    ///
    /// Returns [`FrameError::Eof`] when the peer closes the stream cleanly
    /// (no bytes pending) and [`FrameError::Truncated`] when it closes
    /// mid-frame.
    pub async fn read_frame(&mut self) -> Result<String, FrameError> {
        let mut buf = Vec::new();

        let bytes_read = self.inner.read_until(SENTINEL, &mut buf).await?;
        if bytes_read == 0 {
            return Err(FrameError::Eof);
        }

        if buf.pop() != Some(SENTINEL) {
            return Err(FrameError::Truncated { len: bytes_read });
        }

        Ok(String::from_utf8(buf)?)
    }
}

/// Buffered writing side of a framed connection.
pub struct FrameWriter<W> {
    inner: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
        }
    }

    /// Writes one frame: payload, sentinel, flush.
    pub async fn write_frame(&mut self, payload: &str) -> Result<(), FrameError> {
        self.inner.write_all(payload.as_bytes()).await?;
        self.inner.write_all(&[SENTINEL]).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Flushes any buffered bytes and shuts down the underlying stream.
    pub async fn shutdown(&mut self) -> Result<(), FrameError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
