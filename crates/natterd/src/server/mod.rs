//! TCP server for the chat daemon.
//!
//! The server:
//! - Listens on a TCP port for client connections
//! - Spawns a ConnectionHandler for each client
//! - Tears down in order on shutdown: accept loop first, then live
//!   connections, then the registry
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   ChatServer    │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ConnectionHandler│────▶│  RegistryHandle │
//! │   (per client)  │     │                 │
//! └─────────────────┘     └─────────────────┘
//!         │
//!         │ broadcast fan-out
//!         ▼
//! ┌─────────────────┐
//! │  Chat clients   │
//! │ (all sessions)  │
//! └─────────────────┘
//! ```

mod connection;

pub use connection::{ConnectionError, ConnectionHandler};

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::registry::RegistryHandle;

/// Default listen address for the daemon.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// TCP server that owns the accept loop and supervises connections.
pub struct ChatServer {
    /// Bound listening socket
    listener: TcpListener,

    /// Handle to the session registry
    registry: RegistryHandle,

    /// External stop signal; only the accept loop watches it
    cancel_token: CancellationToken,

    /// Cancelled by the server itself once accepting has stopped,
    /// unblocking every connection handler's pending read
    connection_token: CancellationToken,
}

impl ChatServer {
    /// Binds the listening socket.
    ///
    /// Returns with the listener live, so a client connecting after
    /// this call will be accepted once [`ChatServer::run`] starts.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound.
    /// This is fatal: without a listener there is no server.
    pub async fn bind(
        host: &str,
        port: u16,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                error: e.to_string(),
            })?;

        let local = listener.local_addr().map_err(|e| ServerError::Bind {
            addr,
            error: e.to_string(),
        })?;
        info!(addr = %local, "Chat server listening");

        Ok(Self {
            listener,
            registry,
            cancel_token,
            connection_token: CancellationToken::new(),
        })
    }

    /// Returns the bound address, useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until the stop token fires, then shuts down in order:
    /// stop accepting, cancel and await live connections, shut down
    /// the registry last so handlers can still unregister.
    pub async fn run(self) {
        let Self {
            listener,
            registry,
            cancel_token,
            connection_token,
        } = self;

        let mut connection_counter: u64 = 0;
        let mut handlers = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            connection_counter += 1;
                            debug!(
                                peer = %peer_addr,
                                connection = connection_counter,
                                "Accepted connection"
                            );
                            let handler = ConnectionHandler::new(
                                stream,
                                registry.clone(),
                                connection_token.clone(),
                                connection_counter,
                            );
                            handlers.spawn(handler.run());
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Keep serving the connections we have
                        }
                    }
                }
            }
        }

        // Stop accepting before touching live connections, so a late
        // client cannot slip in mid-teardown.
        drop(listener);

        connection_token.cancel();
        while let Some(result) = handlers.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Connection task did not finish cleanly");
            }
        }

        if let Err(e) = registry.shutdown().await {
            warn!(error = %e, "Registry was already stopped");
        }

        info!("Server shutdown complete");
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },
}

// ============================================================================
// Tests
// ============================================================================
