//! Chat message entity and its wire codec.
//!
//! Wire form is three fields joined by single tabs, in fixed order:
//!
//! ```text
//! <epoch_ms>\t<author>\t<body>
//! ```
//!
//! The codec performs no escaping. Author names are guaranteed tab-free by
//! [`Username`] validation; a body containing a tab survives decoding (the
//! split is bounded to three parts) but breaks the round-trip law, so
//! producing one is a caller error.

use crate::error::CodecError;
use crate::name::Username;
use chrono::{DateTime, Utc};
use std::fmt;

/// Field separator in the wire form of a message.
pub const FIELD_SEPARATOR: char = '\t';

/// A single chat message, immutable once constructed.
///
/// Created by a connection handler when a client frame arrives; consumed by
/// the registry for broadcast and by clients for display. Timestamps carry
/// millisecond precision: anything finer is truncated at construction so that
/// `decode(encode(m)) == m` holds exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    author: Username,
    body: String,
    timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message with an explicit timestamp.
    pub fn new(author: Username, body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            author,
            body: body.into(),
            timestamp: truncate_to_millis(timestamp),
        }
    }

    /// Creates a message stamped with the current wall-clock time.
    pub fn now(author: Username, body: impl Into<String>) -> Self {
        Self::new(author, body, Utc::now())
    }

    /// The display name of the sender.
    pub fn author(&self) -> &Username {
        &self.author
    }

    /// The message text as typed by the sender.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// When the server accepted the message.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Timestamp as milliseconds since the Unix epoch, as it appears on the wire.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Encodes the message to its wire form.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.timestamp_millis(),
            self.author,
            self.body,
            sep = FIELD_SEPARATOR,
        )
    }

    /// Decodes a wire string back into a message.
    ///
    /// Splits on at most two tabs; fails if fewer than three fields result
    /// or if the first field is not a millisecond epoch timestamp. The
    /// author field must also satisfy [`Username::parse`], a stricter
    /// requirement than the wire shape itself imposes; a malformed author
    /// is rejected as [`CodecError::InvalidAuthor`].
    pub fn decode(wire: &str) -> Result<Self, CodecError> {
        let mut parts = wire.splitn(3, FIELD_SEPARATOR);
        let (Some(raw_ts), Some(raw_author), Some(body)) =
            (parts.next(), parts.next(), parts.next())
        else {
            let found = wire.split(FIELD_SEPARATOR).count();
            return Err(CodecError::MissingFields { found });
        };

        let millis: i64 = raw_ts.parse().map_err(|_| CodecError::InvalidTimestamp {
            value: raw_ts.to_string(),
        })?;
        let timestamp =
            DateTime::from_timestamp_millis(millis).ok_or_else(|| CodecError::InvalidTimestamp {
                value: raw_ts.to_string(),
            })?;
        let author = Username::parse(raw_author)?;

        Ok(Self {
            author,
            body: body.to_string(),
            timestamp,
        })
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.author, self.body)
    }
}

/// Drops sub-millisecond precision so in-memory equality matches wire equality.
fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp.timestamp_millis()).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> Username {
        Username::parse(raw).unwrap()
    }

    #[test]
    fn test_encode_wire_form() {
        let timestamp = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let message = ChatMessage::new(name("alice"), "hello", timestamp);
        assert_eq!(message.encode(), "1700000000000\talice\thello");
    }

    #[test]
    fn test_decode_wire_form() {
        let message = ChatMessage::decode("1700000000000\talice\thello").unwrap();
        assert_eq!(message.author().as_str(), "alice");
        assert_eq!(message.body(), "hello");
        assert_eq!(message.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_round_trip_preserves_message() {
        let message = ChatMessage::now(name("bob"), "how's it going?");
        let decoded = ChatMessage::decode(&message.encode()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_round_trip_empty_body() {
        let message = ChatMessage::now(name("bob"), "");
        let decoded = ChatMessage::decode(&message.encode()).unwrap();
        assert_eq!(decoded, message);
        assert_eq!(decoded.body(), "");
    }

    #[test]
    fn test_decode_preserves_tabs_in_body() {
        // Split is bounded to three parts, so the body keeps its tabs.
        let decoded = ChatMessage::decode("0\talice\tcol1\tcol2\tcol3").unwrap();
        assert_eq!(decoded.body(), "col1\tcol2\tcol3");
    }

    #[test]
    fn test_decode_rejects_untabbed_input() {
        let err = ChatMessage::decode("not-a-valid-frame").unwrap_err();
        assert_eq!(err, CodecError::MissingFields { found: 1 });
    }

    #[test]
    fn test_decode_rejects_two_fields() {
        let err = ChatMessage::decode("1700000000000\talice").unwrap_err();
        assert_eq!(err, CodecError::MissingFields { found: 2 });
    }

    #[test]
    fn test_decode_rejects_non_numeric_timestamp() {
        let err = ChatMessage::decode("yesterday\talice\thello").unwrap_err();
        assert!(matches!(err, CodecError::InvalidTimestamp { value } if value == "yesterday"));
    }

    #[test]
    fn test_decode_rejects_out_of_range_timestamp() {
        let wire = format!("{}\talice\thello", i64::MAX);
        assert!(matches!(
            ChatMessage::decode(&wire),
            Err(CodecError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_decode_accepts_negative_timestamp() {
        // Pre-epoch instants are representable and legal on the wire.
        let decoded = ChatMessage::decode("-1000\talice\thello").unwrap();
        assert_eq!(decoded.timestamp_millis(), -1000);
    }

    #[test]
    fn test_decode_rejects_empty_author() {
        assert!(matches!(
            ChatMessage::decode("0\t\thello"),
            Err(CodecError::InvalidAuthor(_))
        ));
    }

    #[test]
    fn test_decode_rejects_newline_author() {
        assert!(matches!(
            ChatMessage::decode("0\tali\nce\thello"),
            Err(CodecError::InvalidAuthor(_))
        ));
    }

    #[test]
    fn test_timestamp_truncated_to_millis() {
        let fine = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
            + chrono::Duration::microseconds(417);
        let message = ChatMessage::new(name("alice"), "hi", fine);
        assert_eq!(message.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(
            ChatMessage::decode(&message.encode()).unwrap(),
            message,
            "sub-millisecond precision must not break equality"
        );
    }

    #[test]
    fn test_display_form() {
        let message = ChatMessage::now(name("alice"), "hello");
        assert_eq!(format!("{message}"), "[alice] hello");
    }
}
