//! A demo document server: wires `DocumentServer` to a TCP transport carrying
//! newline-delimited JSON, so the engine can be exercised end to end without an
//! embedder. Not part of the library; `scribe_ot` itself takes no configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use scribe_ot::document_server::DocumentServer;
use scribe_ot::message::{ClientMessage, ClientRequest, ServerMessage};
use scribe_ot::server::StateStore;
use scribe_ot::token::CharArray;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(version, about = "A real-time collaborative text document server.")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 9292)]
    port: u16,

    /// Enable debug-level logging.
    #[arg(long)]
    debug: bool,

    /// Initial document contents.
    #[arg(long, default_value = "")]
    initial_text: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    scribe_ot::logging::initialize(cli.debug);

    let store = Arc::new(StateStore::new(CharArray::from(cli.initial_text.as_str())));
    let server = Arc::new(DocumentServer::new(store));

    let run_server = Arc::clone(&server);
    tokio::spawn(async move { run_server.run().await });

    let listener = TcpListener::bind(("127.0.0.1", cli.port))
        .await
        .with_context(|| format!("failed to bind to port {}", cli.port))?;
    info!(port = cli.port, "listening for clients");

    tokio::select! {
        () = accept_loop(listener, Arc::clone(&server)) => {}
        () = wait_for_shutdown() => {
            info!("shutting down");
        }
    }

    Ok(())
}

async fn accept_loop(listener: TcpListener, server: Arc<DocumentServer<CharArray>>) {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(%err, "failed to accept a connection");
                continue;
            }
        };
        info!(%addr, "client connected");
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(server, socket).await {
                warn!(%addr, %err, "connection ended with an error");
            }
        });
    }
}

async fn wait_for_shutdown() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            debug!("got SIGINT (Ctrl+C)");
        }
    }
}

async fn handle_connection(server: Arc<DocumentServer<CharArray>>, socket: TcpStream) -> Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let (client_id, mut from_server) = server.new_client().await;
    let sender = server.client_sender();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let request: ClientRequest<CharArray> = serde_json::from_str(&line)
                    .context("failed to parse client request")?;
                sender
                    .send(ClientMessage {
                        client_id,
                        author_id: request.author_id,
                        revision: request.revision,
                        op: request.op,
                    })
                    .await
                    .context("document server actor is no longer running")?;
            }
            message = from_server.recv() => {
                let Some(message) = message else { break };
                let is_error = matches!(message, ServerMessage::Error(_));
                let json = serde_json::to_string(&message)?;
                write_half.write_all(json.as_bytes()).await?;
                write_half.write_all(b"\n").await?;
                if is_error {
                    break;
                }
            }
        }
    }

    server.remove_client(client_id).await;
    Ok(())
}
