//! Handlers for raw-signal ingestion.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/scores` | Body: [`NewRawScore`]; 400 if the score is outside 0–5 |
//! | `POST` | `/entry-links` | Body: [`NewEntryLink`]; 400 if strength is outside 0–1 |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use wisdom_core::{
  engine::FulfillmentEngine,
  signal::{NewEntryLink, NewRawScore},
  store::FulfillmentStore,
};

use crate::error::ApiError;

/// `POST /scores`: returns 201 + the stored raw score.
pub async fn record_score<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Json(body): Json<NewRawScore>,
) -> Result<impl IntoResponse, ApiError> {
  let score = engine
    .store()
    .record_raw_score(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(score)))
}

/// `POST /entry-links`: returns 201 + the stored link.
pub async fn record_entry_link<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Json(body): Json<NewEntryLink>,
) -> Result<impl IntoResponse, ApiError> {
  let link = engine
    .store()
    .record_entry_link(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(link)))
}
