//! # linus-server
//!
//! ```bash
//! linus-server                       # platform config dir, then defaults
//! linus-server --config server.toml
//! LINUS_PORT=9000 linus-server
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::{error, info};

use linus_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    linus_server::init_tracing();

    info!("Starting Linus POS server");

    let config_path = parse_args()?;
    let config = ServerConfig::load(config_path).context("Failed to load configuration")?;
    let addr = config.server.socket_addr()?;

    let app = linus_server::start(&config)
        .await
        .context("Failed to start application")?;
    let router = linus_server::build_router(app.state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    app.shutdown().await;
    served.context("Server error")?;
    Ok(())
}

fn parse_args() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config requires a path")?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("Usage: linus-server [--config <path>]");
                std::process::exit(0);
            }
            other => bail!("Unknown argument: {other}"),
        }
    }

    Ok(config)
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
