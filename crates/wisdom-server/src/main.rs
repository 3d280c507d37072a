//! `wisdom`: WisdomOS fulfillment server and batch tool.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and either serves the JSON API or runs one computation and prints the
//! result as JSON.
//!
//! ```text
//! wisdom serve
//! wisdom rollup --user <UUID> --period 2025-03
//! wisdom ritual-impact --user <UUID> --period 2025-Q1 --persist
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use wisdom_core::{
  engine::FulfillmentEngine,
  period::{Period, PeriodType},
};
use wisdom_server::{ServerConfig, expand_tilde};
use wisdom_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "WisdomOS fulfillment scoring engine")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", env = "WISDOM_CONFIG")]
  config: std::path::PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,

  /// Compute and persist the rollup for one user and period.
  Rollup {
    #[arg(long)]
    user:        Uuid,
    /// `YYYY-MM` or `YYYY-Qn`.
    #[arg(long)]
    period:      String,
    #[arg(long, value_parser = parse_period_type)]
    period_type: Option<PeriodType>,
  },

  /// Compute ritual impact for one user and period.
  RitualImpact {
    #[arg(long)]
    user:    Uuid,
    #[arg(long)]
    period:  String,
    /// Also record the impact as system-estimated scores.
    #[arg(long)]
    persist: bool,
  },
}

fn parse_period_type(s: &str) -> Result<PeriodType, String> {
  s.parse().map_err(|_| format!("expected monthly or quarterly, got {s:?}"))
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
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let cfg = ServerConfig::load(&cli.config).context("failed to read config")?;

  // Open SQLite store.
  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = FulfillmentEngine::with_config(Arc::new(store), cfg.engine);

  match cli.command {
    Command::Serve => {
      let app = wisdom_server::router(engine);
      let address = cfg.address();

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

      axum::serve(listener, app).await.context("server error")?;
    }
    Command::Rollup { user, period, period_type } => {
      let report = engine
        .run_full_rollup(user, &period, period_type)
        .await
        .with_context(|| format!("rollup failed for {period}"))?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Command::RitualImpact { user, period, persist } => {
      let period = Period::parse(&period, None)?;
      let report = if persist {
        engine.persist_ritual_impact(user, period).await
      } else {
        engine.compute_ritual_impact(user, period).await
      }
      .with_context(|| format!("ritual impact failed for {period}"))?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
  }

  Ok(())
}
