//! Natter client - connection handling for the chat CLI.
//!
//! This crate provides the client side of the chat room: reaching the
//! server, claiming a display name, and exchanging frames once
//! admitted. Terminal interaction lives in the `natter` binary; this
//! crate only speaks the wire protocol.

pub mod client;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use client::{ChatClient, LineSink, MessageStream};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
