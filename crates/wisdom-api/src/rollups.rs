//! Handlers for `/rollups` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/rollups` | Body: [`RunBody`]; computes and persists |
//! | `GET`    | `/rollups/:user_id/:period` | Cached rollup; 404 if never computed |
//! | `DELETE` | `/rollups/:user_id/:period` | 204, or 404 if nothing was cached |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;
use wisdom_core::{
  engine::FulfillmentEngine,
  period::{Period, PeriodType},
  rollup::RollupReport,
  store::FulfillmentStore,
};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RunBody {
  pub user_id:     Uuid,
  pub period:      String,
  /// When set, the period string must have this shape.
  #[serde(default)]
  pub period_type: Option<PeriodType>,
}

/// `POST /rollups`
pub async fn run<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Json(body): Json<RunBody>,
) -> Result<Json<RollupReport>, ApiError> {
  let report = engine
    .run_full_rollup(body.user_id, &body.period, body.period_type)
    .await?;
  Ok(Json(report))
}

/// `GET /rollups/:user_id/:period`
pub async fn get_one<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path((user_id, period)): Path<(Uuid, String)>,
) -> Result<Json<RollupReport>, ApiError> {
  let period = Period::parse(&period, None)?;
  let report = engine
    .load_rollup(user_id, period)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no rollup for {period}")))?;
  Ok(Json(report))
}

/// `DELETE /rollups/:user_id/:period`
pub async fn delete_one<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path((user_id, period)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
  let period = Period::parse(&period, None)?;
  let removed = engine
    .store()
    .delete_rollup(user_id, period)
    .await
    .map_err(ApiError::store)?;
  if removed {
    tracing::info!(%user_id, %period, "dropped cached rollup");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("no rollup for {period}")))
  }
}
