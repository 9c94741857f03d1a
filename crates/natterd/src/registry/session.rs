//! Registered participant state.

use natter_core::Username;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Capacity of a session's outbound frame queue.
///
/// A slow reader can fall this many frames behind before the registry
/// starts dropping frames for it. The queue decouples broadcast from
/// socket writes so one stalled peer cannot stall the room.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Why a frame could not be queued for a session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The session's outbound queue is full (slow reader).
    #[error("outbound queue full")]
    QueueFull,

    /// The session's writer task has already stopped.
    #[error("outbound queue closed")]
    Disconnected,
}

/// A registered chat participant.
///
/// Holds the participant's unique name and the sending half of its
/// outbound queue. The receiving half lives with the connection's
/// writer task; dropping a `Session` closes the queue and lets that
/// task drain and exit.
#[derive(Debug, Clone)]
pub struct Session {
    name: Username,
    outbound: mpsc::Sender<String>,
}

impl Session {
    pub fn new(name: Username, outbound: mpsc::Sender<String>) -> Self {
        Self { name, outbound }
    }

    #[must_use]
    pub fn name(&self) -> &Username {
        &self.name
    }

    /// Queues a frame for delivery without waiting.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::QueueFull` if the queue is at capacity
    /// and `DeliveryError::Disconnected` if the writer task is gone.
    pub fn send(&self, frame: String) -> Result<(), DeliveryError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Disconnected,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
