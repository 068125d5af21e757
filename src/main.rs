//! Shutdown demo daemon.
//!
//! Binds a TCP listener that greets every connection, wires it into a
//! [`Lifecycle`] built from the config file, and exits once a termination
//! signal has drained everything.
//!
//! ```text
//! SIGINT/SIGTERM → root ─┬→ grpc plane
//!                        ├→ http plane  (listener, High)
//!                        ├→ admin plane
//!                        └→ delay → default coordinator (shared resources)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use closer::config::{load_config, CloserConfig};
use closer::observability::{logging, metrics};
use closer::{global, BoxError, Lifecycle, Plane, Priority, Teardown};

#[derive(Parser)]
#[command(name = "closer")]
#[command(about = "Tiered graceful-shutdown demo daemon", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address for the demo listener.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, warnings) = match &cli.config {
        Some(path) => load_config(path)?,
        None => (CloserConfig::default(), Vec::new()),
    };

    logging::init_logging(&config.observability.log_filter);
    tracing::info!("closer v{} starting", env!("CARGO_PKG_VERSION"));

    for warning in &warnings {
        tracing::warn!(%warning, "Configuration warning");
    }

    tracing::info!(
        timeout_ms = config.shutdown.timeout_ms,
        delay_ms = config.shutdown.delay_ms,
        signals = ?config.shutdown.signals,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let lifecycle = Lifecycle::new(&config.shutdown);

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let stop = CancellationToken::new();
    let accept_loop = tokio::spawn(serve(listener, stop.clone()));

    lifecycle.plane(Plane::Http).register_at(
        Priority::High,
        [Teardown::new(move || async move {
            stop.cancel();
            accept_loop.await.map_err(BoxError::from)
        })
        .named("listener")],
    );

    global::register([Teardown::new(|| async {
        tracing::info!("Releasing shared resources");
        Ok(())
    })
    .named("shared-resources")]);

    lifecycle.run_until_shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Accept connections until `stop` is cancelled.
async fn serve(listener: TcpListener, stop: CancellationToken) {
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((mut socket, peer)) => {
                    tracing::debug!(peer_addr = %peer, "Connection accepted");
                    tokio::spawn(async move {
                        if let Err(e) = greet(&mut socket).await {
                            tracing::debug!(peer_addr = %peer, error = %e, "Failed to greet connection");
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Failed to accept connection"),
            },
        }
    }

    tracing::info!("Listener stopped");
}

async fn greet(socket: &mut TcpStream) -> std::io::Result<()> {
    socket.write_all(b"hello from closer\n").await?;
    socket.shutdown().await
}
