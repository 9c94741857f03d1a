//! Client configuration: where to find the chat server.

use std::path::Path;

use natter_protocol::{DEFAULT_HOST, DEFAULT_PORT};
use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Connection settings for the chat client.
///
/// Loaded from a TOML file when one is given; each missing field
/// falls back to the well-known default, so a partial file is fine.
///
/// # Example
///
/// ```toml
/// host = "chat.example.net"
/// port = 4000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Server hostname or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ClientConfig {
    /// Reads connection settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ConfigRead` if the file cannot be read
    /// and `ClientError::ConfigParse` if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ClientError::ConfigRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&raw).map_err(|e| ClientError::ConfigParse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// The `host:port` form used for connecting.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("natter.toml");
        let mut file = std::fs::File::create(&path).expect("create config file");
        file.write_all(contents.as_bytes()).expect("write config");
        (dir, path)
    }

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_config_addr() {
        let config = ClientConfig {
            host: "example.net".to_string(),
            port: 9000,
        };
        assert_eq!(config.addr(), "example.net:9000");
    }

    #[test]
    fn test_load_full_file() {
        let (_dir, path) = write_config("host = \"chat.example.net\"\nport = 5555\n");

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.host, "chat.example.net");
        assert_eq!(config.port, 5555);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let (_dir, path) = write_config("port = 5555\n");

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, 5555);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("absent.toml");

        let result = ClientConfig::load(&path);
        assert!(matches!(result, Err(ClientError::ConfigRead { .. })));
    }

    #[test]
    fn test_load_invalid_toml() {
        let (_dir, path) = write_config("port = \"not a number\"\n");

        let result = ClientConfig::load(&path);
        assert!(matches!(result, Err(ClientError::ConfigParse { .. })));
    }
}
