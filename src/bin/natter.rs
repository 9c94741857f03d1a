//! Natter - line-oriented chat client
//!
//! Connects to a natter daemon, negotiates a unique name, then relays
//! stdin lines to the room and prints every broadcast message.
//!
//! # Usage
//!
//! ```text
//! natter                          # Connect to 127.0.0.1:4000
//! natter --host chat.example.com  # Different server
//! natter -p 5000                  # Different port
//! natter --config natter.toml     # host/port from a TOML file
//! ```
//!
//! Flags override the config file; the config file overrides the
//! built-in defaults. Type `/quit` (or close stdin) to leave the room.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use natter_client::{ChatClient, ClientConfig, LineSink, MessageStream};
use natter_protocol::HandshakeReply;

/// Command that ends the session from the prompt.
const QUIT_COMMAND: &str = "/quit";

/// Natter - single-room chat client
#[derive(Parser, Debug)]
#[command(name = "natter", version, about)]
struct Args {
    /// Server address to connect to (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Server port to connect to (overrides the config file)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Path to a TOML config file with host/port
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn resolve_config(args: Args) -> Result<ClientConfig> {
    let mut config = match args.config {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Chat lines go to stdout; keep logs on stderr and quiet by default.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("natter_client=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = resolve_config(args)?;

    let mut client = ChatClient::connect(&config).await?;
    let welcome = client.read_welcome().await?;
    println!("{welcome}");

    let mut lines = BufReader::new(stdin()).lines();

    let Some(name) = negotiate_name(&mut client, &mut lines).await? else {
        return Ok(());
    };
    println!("Joined as {name}. Type {QUIT_COMMAND} to leave.");

    let (stream, sink) = client.split();
    let cancel_token = CancellationToken::new();

    let receive_task = tokio::spawn(receive_messages(stream, cancel_token.clone()));

    send_lines(sink, &mut lines, &cancel_token).await;

    let _ = receive_task.await;
    Ok(())
}

/// Prompts for names until the server accepts one.
///
/// Returns `None` if stdin closes before a name is accepted.
async fn negotiate_name(
    client: &mut ChatClient,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<String>> {
    loop {
        println!("Enter a name:");
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            return Ok(None);
        };
        let candidate = line.trim().to_string();
        if candidate.is_empty() {
            continue;
        }
        match client.claim_name(&candidate).await? {
            HandshakeReply::Accepted => return Ok(Some(candidate)),
            HandshakeReply::Rejected => {
                println!("Name taken or invalid, try another.");
            }
        }
    }
}

/// Prints every broadcast message until the server closes or the
/// session is cancelled.
async fn receive_messages(mut stream: MessageStream, cancel_token: CancellationToken) {
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            message = stream.next_message() => match message {
                Ok(Some(message)) => println!("{message}"),
                Ok(None) => {
                    // Stay quiet when the close was our own quit.
                    if !cancel_token.is_cancelled() {
                        println!("Server closed the connection.");
                    }
                    cancel_token.cancel();
                    break;
                }
                Err(e) => {
                    eprintln!("Connection lost: {e}");
                    cancel_token.cancel();
                    break;
                }
            },
        }
    }
}

/// Relays stdin lines to the room until `/quit`, stdin EOF, or
/// cancellation, then closes the outbound half.
async fn send_lines(
    mut sink: LineSink,
    lines: &mut Lines<BufReader<Stdin>>,
    cancel_token: &CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("Failed to read stdin: {e}");
                        break;
                    }
                };
                if line == QUIT_COMMAND {
                    break;
                }
                if let Err(e) = sink.send_line(&line).await {
                    eprintln!("Failed to send: {e}");
                    break;
                }
            }
        }
    }

    // Cancel before closing so the receive side treats the resulting
    // EOF as our own departure, not a server-side close.
    cancel_token.cancel();
    if let Err(e) = sink.close().await {
        debug!(error = %e, "Error closing connection");
    }
}
