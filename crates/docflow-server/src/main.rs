//! docflow server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, starts any enabled queue drainers, and serves the JSON API.
//!
//! # Seeding
//!
//! ```sh
//! docflow-server --generate 1000
//! ```
//!
//! inserts 1000 drafts into the configured store and exits.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use docflow_api::AppState;
use docflow_core::transition::Direction;
use docflow_engine::{QueueDrainer, TransitionEngine};
use docflow_server::ServerConfig;
use docflow_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "docflow approval server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Insert this many draft documents and exit.
  #[arg(long, value_name = "N")]
  generate: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(config::File::from(cli.config).required(false))
    .context("failed to load configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  if let Some(count) = cli.generate {
    let created = docflow_server::generate(&*store, count).await;
    if created < count {
      anyhow::bail!("created {created} of {count} documents");
    }
    return Ok(());
  }

  let engine = TransitionEngine::new(store, &server_cfg.engine);

  // Queue drainers share the engine's lock table with the HTTP handlers.
  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let drainer = Arc::new(QueueDrainer::new(engine.clone(), server_cfg.drainer.clone()));
  let mut workers = Vec::new();
  for (direction, enabled) in [
    (Direction::Submit, server_cfg.drainer.submit_enabled),
    (Direction::Approve, server_cfg.drainer.approve_enabled),
  ] {
    if enabled {
      workers.push(tokio::spawn(drainer.clone().run(direction, shutdown_rx.clone())));
    }
  }

  let app = docflow_server::app(AppState::new(engine));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // Stop the drainers and let any tick in flight finish.
  shutdown_tx.send_replace(true);
  for worker in workers {
    if let Err(e) = worker.await {
      tracing::error!(error = %e, "queue drainer aborted");
    }
  }

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
