//! Natter core - shared chat domain types.
//!
//! This crate provides the message and identity types shared between
//! the server daemon (natterd) and the command-line client (natter),
//! including the tab-separated wire codec both ends must agree on.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, or direct indexing outside of tests.

pub mod error;
pub mod message;
pub mod name;

// Re-exports for convenience
pub use error::{CodecError, NameError};
pub use message::ChatMessage;
pub use name::Username;
