//! Command types for registry actor communication.

use natter_core::{ChatMessage, Username};
use thiserror::Error;
use tokio::sync::oneshot;

use super::session::{DeliveryError, Session};

/// Commands that can be sent to the registry actor.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Admit a participant under its unique name.
    ///
    /// On success the handshake acceptance frame is queued on the
    /// session's outbound queue within the same actor turn, ahead of
    /// any broadcast that could follow.
    ///
    /// # Errors
    ///
    /// Responds with `RegistryError::NameTaken` if another session
    /// already holds the name, or `RegistryError::SessionUnreachable`
    /// if the session's queue would not take the acceptance frame.
    /// The supplied session is dropped on either error, which closes
    /// its outbound queue.
    Register {
        session: Session,
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Remove a participant by name.
    ///
    /// Idempotent: removing a name that is not registered is a no-op.
    /// Fire-and-forget, no response is sent.
    Unregister { name: Username },

    /// Ask whether a name is currently taken.
    Validate {
        name: Username,
        respond_to: oneshot::Sender<bool>,
    },

    /// Queue a message on every registered session, the author's
    /// included. Fire-and-forget, no response is sent.
    Broadcast { message: ChatMessage },

    /// Drop all sessions and stop the actor loop.
    ///
    /// The response is sent once every outbound queue has been closed.
    Shutdown { respond_to: oneshot::Sender<()> },
}

/// Errors that can occur during registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("name already taken: {0}")]
    NameTaken(Username),

    /// The session's outbound queue would not take the handshake ack,
    /// so the participant was not admitted.
    #[error("session unreachable: {0}")]
    SessionUnreachable(DeliveryError),

    #[error("registry channel closed")]
    ChannelClosed,
}

// ============================================================================
// Tests
// ============================================================================
