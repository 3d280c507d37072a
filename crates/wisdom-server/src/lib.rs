//! Server wiring for the `wisdom` binary: configuration and the HTTP router.

use std::path::{Path, PathBuf};

use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use wisdom_core::{
  engine::{EngineConfig, FulfillmentEngine},
  store::FulfillmentStore,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` layered under
/// `WISDOM__*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub engine:     EngineConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8420 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/wisdom/fulfillment.db") }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Load from an optional TOML file, then environment overrides.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("WISDOM")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full HTTP application: the JSON API under `/api` plus request tracing.
pub fn router<S>(engine: FulfillmentEngine<S>) -> Router
where
  S: FulfillmentStore + 'static,
{
  Router::new()
    .nest("/api", wisdom_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::{io::Write as _, sync::Arc};

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;
  use wisdom_core::{memory::MemoryStore, score::NoDataPolicy};

  use super::*;

  #[test]
  fn config_file_sets_engine_policy() {
    let dir = std::env::temp_dir().join(format!("wisdom-cfg-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
      file,
      "host = \"0.0.0.0\"\nport = 9000\nstore_path = \"/tmp/w.db\"\n\n[engine]\nno_data_policy = \"exclude\""
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/w.db"));
    assert_eq!(cfg.engine.no_data_policy, NoDataPolicy::Exclude);

    std::fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn missing_config_file_uses_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/wisdom.toml")).unwrap();
    assert_eq!(cfg.port, 8420);
    assert_eq!(cfg.engine, EngineConfig::default());
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(expand_tilde(Path::new("~/w.db")), PathBuf::from(home).join("w.db"));
    assert_eq!(expand_tilde(Path::new("/abs/w.db")), PathBuf::from("/abs/w.db"));
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let app = router(FulfillmentEngine::new(Arc::new(MemoryStore::new())));
    let uri = format!("/api/areas?user_id={}", uuid::Uuid::new_v4());
    let resp = app
      .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
