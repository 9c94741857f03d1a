//! The registry actor that owns all session state.

use std::collections::HashMap;
use std::ops::ControlFlow;

use natter_core::{ChatMessage, Username};
use natter_protocol::HandshakeReply;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::commands::{RegistryCommand, RegistryError};
use super::session::{DeliveryError, Session};

/// The registry actor that processes commands sequentially.
///
/// Owns the map of registered sessions. All access goes through
/// commands received on a single channel, so no lock is ever taken:
/// uniqueness checks and inserts cannot interleave with each other.
pub struct RegistryActor {
    /// Channel for receiving commands
    receiver: mpsc::Receiver<RegistryCommand>,
    /// Active sessions keyed by their unique name
    sessions: HashMap<Username, Session>,
}

impl RegistryActor {
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>) -> Self {
        Self {
            receiver,
            sessions: HashMap::new(),
        }
    }

    /// Runs the actor's main loop.
    ///
    /// Processes commands until `Shutdown` arrives or every handle has
    /// been dropped. Consumes the actor; state cannot be observed from
    /// outside once the loop ends.
    pub async fn run(mut self) {
        info!("Registry actor started");

        while let Some(command) = self.receiver.recv().await {
            if self.handle_command(command).is_break() {
                break;
            }
        }

        info!("Registry actor stopped");
    }

    /// Processes a single command, responding where a reply slot exists.
    ///
    /// Send failures on reply slots are ignored: the requester timing
    /// out or disconnecting mid-request must not stop the actor.
    fn handle_command(&mut self, command: RegistryCommand) -> ControlFlow<()> {
        match command {
            RegistryCommand::Register {
                session,
                respond_to,
            } => {
                let result = self.handle_register(session);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Unregister { name } => {
                self.handle_unregister(&name);
            }
            RegistryCommand::Validate { name, respond_to } => {
                let taken = self.sessions.contains_key(&name);
                let _ = respond_to.send(taken);
            }
            RegistryCommand::Broadcast { message } => {
                self.handle_broadcast(&message);
            }
            RegistryCommand::Shutdown { respond_to } => {
                self.handle_shutdown();
                let _ = respond_to.send(());
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    /// Admits a session if its name is free and its ack can be queued.
    ///
    /// The name may have been validated earlier in the handshake, but
    /// another registration can land in between, so the check is
    /// repeated here where nothing can interleave with it.
    ///
    /// The acceptance frame is queued in this same turn, before the
    /// insert. Broadcasts only see the session once it is in the map,
    /// so nothing can get onto its queue ahead of the ack; a queue
    /// that will not take the ack fails the registration.
    fn handle_register(&mut self, session: Session) -> Result<(), RegistryError> {
        let name = session.name().clone();

        if self.sessions.contains_key(&name) {
            debug!(name = %name, "Registration rejected, name taken");
            return Err(RegistryError::NameTaken(name));
        }

        // No ack, no admission.
        if let Err(e) = session.send(HandshakeReply::Accepted.as_frame().to_string()) {
            warn!(name = %name, error = %e, "Could not queue handshake ack, rejecting");
            return Err(RegistryError::SessionUnreachable(e));
        }

        self.sessions.insert(name.clone(), session);
        info!(
            name = %name,
            total_sessions = self.sessions.len(),
            "Participant registered"
        );
        Ok(())
    }

    fn handle_unregister(&mut self, name: &Username) {
        if self.sessions.remove(name).is_some() {
            info!(
                name = %name,
                total_sessions = self.sessions.len(),
                "Participant unregistered"
            );
        } else {
            debug!(name = %name, "Unregister for unknown name, ignoring");
        }
    }

    /// Queues the encoded message on every session's outbound queue.
    ///
    /// Delivery is per-session best effort: a full queue drops the
    /// frame for that session only, and a closed queue is logged and
    /// skipped. Neither outcome blocks the actor.
    ///
    /// The map is never mutated here: only a session's own connection
    /// handler removes it. A dead queue leaves the session registered
    /// and its name taken until that unregister arrives.
    fn handle_broadcast(&self, message: &ChatMessage) {
        let frame = message.encode();
        let mut delivered = 0;

        for (name, session) in &self.sessions {
            match session.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::QueueFull) => {
                    warn!(name = %name, "Outbound queue full, frame dropped");
                }
                Err(DeliveryError::Disconnected) => {
                    debug!(name = %name, "Outbound queue closed, left for unregister");
                }
            }
        }

        debug!(
            author = %message.author(),
            delivered,
            total_sessions = self.sessions.len(),
            "Message broadcast"
        );
    }

    /// Drops every session, closing each outbound queue so writer
    /// tasks drain and exit.
    fn handle_shutdown(&mut self) {
        let count = self.sessions.len();
        self.sessions.clear();
        info!(dropped_sessions = count, "Registry shut down");
    }

    /// Returns the current number of sessions (for testing).
    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
