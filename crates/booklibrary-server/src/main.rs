//! booklibrary server binary.
//!
//! Reads `booklibrary.toml` (or the path given with `--config`), opens the
//! SQLite document store and serves the book REST API over HTTP until it
//! receives SIGINT or SIGTERM.

mod settings;

use std::{future::IntoFuture, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::{ServiceExt, extract::Request};
use booklibrary_api::{AppState, Metrics};
use booklibrary_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

#[derive(Parser)]
#[command(author, version, about = "Book library REST server")]
struct Cli {
  /// Path to the TOML configuration file. A missing file is not an error.
  #[arg(short, long, default_value = "booklibrary.toml")]
  config: PathBuf,

  /// HTTP port to listen on.
  #[arg(short, long)]
  port: Option<u16>,

  /// SQLite database file holding the collection.
  #[arg(long)]
  store_path: Option<PathBuf>,

  /// Collection (table) name.
  #[arg(long)]
  collection: Option<String>,

  /// Enable debug logging.
  #[arg(long)]
  debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let settings = Settings::load(&cli).context("failed to load settings")?;

  let level = if settings.debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy(),
    )
    .init();

  let store = SqliteStore::open(settings.store_options())
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  let metrics = Metrics::new().context("failed to register metrics")?;
  let mut state = AppState::new(Arc::new(store.clone())).with_metrics(metrics);
  if let Some(timeout) = settings.request_timeout() {
    state = state.with_request_timeout(timeout);
  }

  let app = booklibrary_api::service(state);
  let address = format!("{}:{}", settings.host, settings.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let (stop_tx, mut stop_rx) = watch::channel(false);
  let server = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
    .with_graceful_shutdown(async move {
      let _ = stop_rx.wait_for(|stop| *stop).await;
    });
  let mut server = tokio::spawn(server.into_future());

  tokio::select! {
    joined = &mut server => {
      joined.context("server task failed")?.context("server error")?;
    }
    () = shutdown_signal() => {
      let _ = stop_tx.send(true);
      let drain = settings.shutdown_timeout();
      match tokio::time::timeout(drain, &mut server).await {
        Ok(joined) => joined.context("server task failed")?.context("server error")?,
        Err(_) => {
          tracing::warn!(timeout = ?drain, "connections still open after drain timeout, aborting");
          server.abort();
        }
      }
    }
  }

  store.close().await.context("failed to close store")?;
  tracing::info!("store closed, exiting");
  Ok(())
}

/// Resolves on the first SIGINT or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "installing SIGINT handler");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "installing SIGTERM handler");
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
  tracing::info!("shutdown signal received, draining connections");
}
