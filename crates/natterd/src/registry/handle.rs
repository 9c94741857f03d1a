//! Handle for communicating with the registry actor.

use natter_core::{ChatMessage, Username};
use tokio::sync::{mpsc, oneshot};

use super::commands::{RegistryCommand, RegistryError};
use super::session::Session;

/// A cloneable handle to the registry actor.
///
/// Connection handlers each hold a clone; the actor exits once every
/// clone is dropped or a `shutdown` call is made.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Registers a session under its name.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NameTaken` if the name is already held,
    /// `RegistryError::SessionUnreachable` if the session's queue
    /// would not take the acceptance frame, and
    /// `RegistryError::ChannelClosed` if the actor has stopped.
    pub async fn register(&self, session: Session) -> Result<(), RegistryError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Register {
                session,
                respond_to,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;
        response.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Removes a session by name. Unknown names are silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ChannelClosed` if the actor has stopped.
    pub async fn unregister(&self, name: Username) -> Result<(), RegistryError> {
        self.sender
            .send(RegistryCommand::Unregister { name })
            .await
            .map_err(|_| RegistryError::ChannelClosed)
    }

    /// Returns `true` if the name is currently registered.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ChannelClosed` if the actor has stopped.
    pub async fn validate(&self, name: Username) -> Result<bool, RegistryError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Validate { name, respond_to })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;
        response.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Queues a message for delivery to every session.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ChannelClosed` if the actor has stopped.
    pub async fn broadcast(&self, message: ChatMessage) -> Result<(), RegistryError> {
        self.sender
            .send(RegistryCommand::Broadcast { message })
            .await
            .map_err(|_| RegistryError::ChannelClosed)
    }

    /// Drops every session and stops the actor, waiting for the ack.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ChannelClosed` if the actor had already
    /// stopped.
    pub async fn shutdown(&self) -> Result<(), RegistryError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(RegistryCommand::Shutdown { respond_to })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;
        response.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Checks if the registry actor is still running.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

// ============================================================================
// Tests
// ============================================================================
