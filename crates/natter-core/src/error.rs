//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur when decoding a message from its wire form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Wire string did not split into the three expected fields
    #[error("invalid message format: expected 3 tab-separated fields, found {found}")]
    MissingFields { found: usize },

    /// First field did not parse as a millisecond epoch timestamp
    #[error("invalid message timestamp: {value:?}")]
    InvalidTimestamp { value: String },

    /// Author field is not a usable display name
    #[error("invalid message author: {0}")]
    InvalidAuthor(#[from] NameError),
}

/// Errors that can occur when validating a display name.
///
/// Names are embedded verbatim in the wire form of every message, so the
/// characters that delimit fields and frames are forbidden in them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Empty string
    #[error("name must not be empty")]
    Empty,

    /// Name contains a character reserved by the codec or framing
    #[error("name contains reserved character {0:?}")]
    ReservedCharacter(char),
}
