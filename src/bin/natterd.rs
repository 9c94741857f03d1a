//! Natter daemon - chat room server
//!
//! This binary listens for TCP connections, negotiates a unique name with
//! each client, and broadcasts every chat line to all connected
//! participants. It runs in the foreground until SIGINT or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default endpoint (0.0.0.0:4000)
//! natterd
//!
//! # Pick a different endpoint
//! natterd --host 127.0.0.1 --port 5000
//!
//! # Environment fallbacks apply when the flags are absent
//! NATTER_HOST=10.0.0.5 NATTER_PORT=4100 natterd
//! ```

use std::env;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use natter_protocol::DEFAULT_PORT;
use natterd::registry::spawn_registry;
use natterd::server::{ChatServer, DEFAULT_BIND_HOST};

/// Natter daemon - single-room chat server
#[derive(Parser, Debug)]
#[command(name = "natterd", version, about)]
struct Args {
    /// Address to listen on (falls back to NATTER_HOST, then 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (falls back to NATTER_PORT, then 4000)
    #[arg(long, short = 'p')]
    port: Option<u16>,
}

fn resolve_host(flag: Option<String>) -> String {
    flag.or_else(|| env::var("NATTER_HOST").ok())
        .unwrap_or_else(|| DEFAULT_BIND_HOST.to_string())
}

fn resolve_port(flag: Option<u16>) -> Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match env::var("NATTER_PORT") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid NATTER_PORT value: {raw}")),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("natterd=info".parse()?)
                .add_directive("natter_core=info".parse()?)
                .add_directive("natter_protocol=info".parse()?),
        )
        .init();

    let host = resolve_host(args.host);
    let port = resolve_port(args.port)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Natter daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let registry = spawn_registry();
    info!("Session registry started");

    let server = ChatServer::bind(&host, port, registry, cancel_token).await?;
    server.run().await;

    info!("Natter daemon stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
