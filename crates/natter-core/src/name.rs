//! Display name value object.

use crate::error::NameError;
use std::fmt;

/// A participant's display name, unique across the room once registered.
///
/// Construction goes through [`Username::parse`], which rejects names that
/// would corrupt the message codec (tab-separated fields) or the frame
/// transport (NUL-delimited frames). A `Username` that exists is therefore
/// always safe to embed in an encoded message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validates and wraps a candidate display name.
    ///
    /// Rejects the empty string and names containing tab, newline, or NUL.
    /// Anything else is accepted; length is not limited.
    pub fn parse(raw: impl Into<String>) -> Result<Self, NameError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(NameError::Empty);
        }
        if let Some(reserved) = raw.chars().find(|c| matches!(c, '\t' | '\n' | '\0')) {
            return Err(NameError::ReservedCharacter(reserved));
        }
        Ok(Self(raw))
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_ordinary_name() {
        let name = Username::parse("alice").unwrap();
        assert_eq!(name.as_str(), "alice");
        assert_eq!(format!("{name}"), "alice");
    }

    #[test]
    fn test_parse_accepts_spaces_and_unicode() {
        assert!(Username::parse("alice the great").is_ok());
        assert!(Username::parse("ålice").is_ok());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(Username::parse(""), Err(NameError::Empty));
    }

    #[test]
    fn test_parse_rejects_tab() {
        assert_eq!(
            Username::parse("ali\tce"),
            Err(NameError::ReservedCharacter('\t'))
        );
    }

    #[test]
    fn test_parse_rejects_newline() {
        assert_eq!(
            Username::parse("alice\n"),
            Err(NameError::ReservedCharacter('\n'))
        );
    }

    #[test]
    fn test_parse_rejects_nul() {
        assert_eq!(
            Username::parse("al\0ice"),
            Err(NameError::ReservedCharacter('\0'))
        );
    }

    #[test]
    fn test_username_usable_as_map_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(Username::parse("alice").unwrap(), 1);
        assert_eq!(map.get(&Username::parse("alice").unwrap()), Some(&1));
    }
}
