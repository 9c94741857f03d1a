//! Error types for the chat client.

use std::path::PathBuf;

use natter_protocol::FrameError;
use thiserror::Error;

/// Errors that can occur while talking to the chat server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Failed to reach the server at all.
    ///
    /// Usually the server is not running or the host/port is wrong.
    #[error("Failed to connect to {addr}: {error}")]
    Connect { addr: String, error: String },

    /// The stream to the server broke or produced an unreadable frame.
    #[error("Transport error: {0}")]
    Transport(#[from] FrameError),

    /// The server answered the name claim with something other than
    /// `"OK"` or `"FAIL"`. Indicates a protocol mismatch.
    #[error("Unexpected handshake reply: {0:?}")]
    UnexpectedReply(String),

    /// The config file could not be read.
    #[error("Failed to read config {path}: {error}")]
    ConfigRead { path: PathBuf, error: String },

    /// The config file is not valid TOML for this client.
    #[error("Invalid config {path}: {error}")]
    ConfigParse { path: PathBuf, error: String },
}

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ============================================================================
// Tests
// ============================================================================
