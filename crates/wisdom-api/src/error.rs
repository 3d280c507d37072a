//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

impl ApiError {
  /// Classify a backend error.
  ///
  /// Walks the source chain for a [`wisdom_core::Error`]: validation failures
  /// become 400s and missing areas or rituals 404s. Anything else is a 500.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    match classify(&e) {
      Some(client) => client,
      None => ApiError::Store(Box::new(e)),
    }
  }
}

impl From<wisdom_core::Error> for ApiError {
  fn from(e: wisdom_core::Error) -> Self { ApiError::store(e) }
}

fn classify(err: &(dyn std::error::Error + 'static)) -> Option<ApiError> {
  use wisdom_core::Error as Core;

  let mut current = Some(err);
  while let Some(e) = current {
    if let Some(core) = e.downcast_ref::<Core>() {
      match core {
        Core::InvalidPeriod(_)
        | Core::PeriodTypeMismatch { .. }
        | Core::InvalidScore(_)
        | Core::InvalidStrength(_)
        | Core::InvalidQuality(_)
        | Core::InvalidWeight(_) => return Some(ApiError::BadRequest(core.to_string())),
        Core::AreaNotFound(_) | Core::DimensionNotFound(_) | Core::RitualNotFound(_) => {
          return Some(ApiError::NotFound(core.to_string()));
        }
        Core::Serialization(_) | Core::Store(_) => {}
      }
    }
    current = e.source();
  }
  None
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[derive(Debug, Error)]
  #[error("backend: {0}")]
  struct Backend(#[source] wisdom_core::Error);

  #[test]
  fn nested_core_errors_are_classified() {
    let err = ApiError::store(Backend(wisdom_core::Error::InvalidScore(9.0)));
    assert!(matches!(err, ApiError::BadRequest(_)));

    let err = ApiError::from(wisdom_core::Error::store(Backend(
      wisdom_core::Error::RitualNotFound(Uuid::nil()),
    )));
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[test]
  fn unrelated_errors_are_internal() {
    let err = ApiError::store(std::io::Error::other("disk on fire"));
    assert!(matches!(err, ApiError::Store(_)));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
