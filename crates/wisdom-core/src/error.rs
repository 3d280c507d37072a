//! Error types for `wisdom-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid period {0:?}: expected YYYY-MM or YYYY-Qn")]
  InvalidPeriod(String),

  #[error("period {period:?} is not a {expected} period")]
  PeriodTypeMismatch { period: String, expected: String },

  #[error("score {0} is outside 0..=5")]
  InvalidScore(f64),

  #[error("entry link strength {0} is outside 0..=1")]
  InvalidStrength(f64),

  #[error("session quality {0} is outside 1..=5")]
  InvalidQuality(u8),

  #[error("weight {0} must be finite and non-negative")]
  InvalidWeight(f64),

  #[error("area not found: {0}")]
  AreaNotFound(Uuid),

  #[error("dimension not found: {0}")]
  DimensionNotFound(Uuid),

  #[error("ritual not found: {0}")]
  RitualNotFound(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
