//! Natter protocol - wire protocol shared by server and client.
//!
//! This crate provides the sentinel-delimited frame transport and the
//! handshake vocabulary (welcome text, accept/reject replies, default
//! endpoint). Message *content* encoding lives in `natter-core`; this
//! crate only moves opaque text frames across a byte stream.

pub mod framing;
pub mod wire;

pub use framing::{FrameError, FrameReader, FrameWriter, SENTINEL};
pub use wire::{HandshakeReply, DEFAULT_HOST, DEFAULT_PORT, WELCOME};
