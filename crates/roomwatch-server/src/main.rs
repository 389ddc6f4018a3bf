//! roomwatch server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) overlaid by
//! `ROOMWATCH_*` environment variables, opens the SQLite reading store,
//! starts the sync window ticker, and serves the ingestion API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use roomwatch_server::{ServerConfig, build_state, router, ticker};
use roomwatch_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "roomwatch presence server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ROOMWATCH").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = build_state(Arc::new(store), &server_cfg).context("invalid configuration")?;
  let (device_a, device_b) = state.monitor.pair().devices();
  tracing::info!(
    device_a,
    device_b,
    temp_threshold = server_cfg.temp_threshold,
    time_window_seconds = server_cfg.time_window_seconds,
    sync_window_max = server_cfg.sync_window_max,
    "presence monitor configured"
  );

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let ticker = ticker::spawn(
    state.monitor.clone(),
    server_cfg.sync_window_period(),
    shutdown_rx,
  );

  let app = router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
      }
    })
    .await
    .context("server error")?;

  shutdown_tx.send(true).ok();
  ticker.await.context("ticker task panicked")?;

  Ok(())
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
