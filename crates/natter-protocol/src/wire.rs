//! Handshake vocabulary and default endpoint.
//!
//! Wire sequence per connection:
//! 1. server → client: [`WELCOME`]
//! 2. client → server: candidate display name
//! 3. server → client: [`HandshakeReply`] (`"OK"` accepts, `"FAIL"` loops
//!    back to step 2)
//! 4. steady state: client → server frames are raw chat text; server →
//!    client frames are encoded messages.

use std::fmt;

/// Greeting frame sent to every new connection.
pub const WELCOME: &str = "Welcome to the natter chat server";

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 4000;

/// Default host the client connects to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server verdict on a candidate display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeReply {
    /// Name claimed; the connection is in the room
    Accepted,
    /// Name taken or unusable; send another candidate
    Rejected,
}

impl HandshakeReply {
    /// Frame payload for this reply.
    pub const fn as_frame(&self) -> &'static str {
        match self {
            Self::Accepted => "OK",
            Self::Rejected => "FAIL",
        }
    }

    /// Parses a reply frame received from the server.
    pub fn from_frame(frame: &str) -> Option<Self> {
        match frame {
            "OK" => Some(Self::Accepted),
            "FAIL" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the handshake completed.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for HandshakeReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_frame())
    }
}
