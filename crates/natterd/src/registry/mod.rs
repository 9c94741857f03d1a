//! Session registry using the actor pattern.
//!
//! All session state lives in a single actor task that processes
//! commands from a channel, so registration, validation, and broadcast
//! are serialized without locks. Handlers talk to it through cloneable
//! handles; replies travel back over per-request oneshot channels.
//!
//! # Architecture
//!
//! ```text
//! ConnectionHandler ──┐
//! ConnectionHandler ──┼── commands ──> RegistryActor ── frames ──> outbound queues
//! ConnectionHandler ──┘                (owns the map)              (one per session,
//!                                                                   drained by writer
//!                                                                   tasks)
//! ```
//!
//! Broadcast never awaits a slow peer: frames are queued with
//! `try_send` and a full queue loses that frame only.

mod actor;
mod commands;
mod handle;
mod session;

pub use actor::RegistryActor;
pub use commands::{RegistryCommand, RegistryError};
pub use handle::RegistryHandle;
pub use session::{DeliveryError, Session, OUTBOUND_QUEUE_CAPACITY};

use tokio::sync::mpsc;

/// Buffer size for the command channel.
const COMMAND_BUFFER: usize = 100;

/// Spawns the registry actor and returns a handle to it.
///
/// The actor runs until [`RegistryHandle::shutdown`] is called or all
/// handles are dropped.
pub fn spawn_registry() -> RegistryHandle {
    let (command_sender, command_receiver) = mpsc::channel(COMMAND_BUFFER);

    let actor = RegistryActor::new(command_receiver);
    tokio::spawn(actor.run());

    RegistryHandle::new(command_sender)
}

// ============================================================================
// Tests
// ============================================================================
