//! Natter daemon - session registry and broadcast server.
//!
//! This crate provides the server side of the chat room:
//! - `registry` - actor that owns the name-to-session mapping
//! - `server` - TCP listener, per-connection handlers, graceful shutdown
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      natterd                             │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌──────────────┐  commands   ┌───────────────────────┐  │
//! │  │  ChatServer  │────────────▶│     RegistryActor     │  │
//! │  │ (TCP accept) │             │  (session state owner)│  │
//! │  └──────┬───────┘             └──────────┬────────────┘  │
//! │         │ connections                    │ frames        │
//! │         ▼                                ▼               │
//! │  ┌──────────────────┐          ┌───────────────────────┐ │
//! │  │ ConnectionHandler│          │  outbound queues      │ │
//! │  │   (per client)   │          │  (one per session)    │ │
//! │  └──────────────────┘          └───────────────────────┘ │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, or direct indexing outside of tests. Channel closure is
//! handled gracefully everywhere.

pub mod registry;
pub mod server;
