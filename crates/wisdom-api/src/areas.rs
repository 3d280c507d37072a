//! Handlers for `/areas` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/areas` | `?user_id` required; global plus user-owned active areas |
//! | `POST`   | `/areas` | Body: [`NewArea`]; returns 201 + stored area |
//! | `GET`    | `/areas/:id/dimensions` | 404 if the area does not exist |
//! | `POST`   | `/areas/:id/dimensions` | Body: [`DimensionBody`] |
//! | `PUT`    | `/areas/:id/weight` | Body: `{"user_id":..,"weight":..}` |
//! | `DELETE` | `/areas/:id/weight` | `?user_id` required |
//! | `GET`    | `/areas/:id/rollup` | `?user_id&period`; computed live, nothing persisted |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wisdom_core::{
  area::{Area, Dimension, NewArea, NewDimension},
  engine::FulfillmentEngine,
  period::Period,
  rollup::{AreaOutcome, ScoringStrategy},
  store::FulfillmentStore,
};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct UserParams {
  pub user_id: Uuid,
}

async fn require_area<S: FulfillmentStore>(
  engine: &FulfillmentEngine<S>,
  id: Uuid,
) -> Result<Area, ApiError> {
  engine
    .store()
    .get_area(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("area {id} not found")))
}

// ─── List / create ────────────────────────────────────────────────────────────

/// `GET /areas?user_id=<id>`
pub async fn list<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Query(params): Query<UserParams>,
) -> Result<Json<Vec<Area>>, ApiError> {
  let areas = engine
    .store()
    .list_areas(params.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(areas))
}

/// `POST /areas`: returns 201 + the stored [`Area`].
pub async fn create<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Json(body): Json<NewArea>,
) -> Result<impl IntoResponse, ApiError> {
  let area = engine.store().add_area(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(area)))
}

// ─── Dimensions ───────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /areas/:id/dimensions`.
#[derive(Debug, Deserialize)]
pub struct DimensionBody {
  pub code:           String,
  pub name:           String,
  pub weight_default: f64,
}

/// `GET /areas/:id/dimensions`
pub async fn list_dimensions<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Dimension>>, ApiError> {
  require_area(&engine, id).await?;
  let dims = engine.store().list_dimensions(id).await.map_err(ApiError::store)?;
  Ok(Json(dims))
}

/// `POST /areas/:id/dimensions`: returns 201 + the stored [`Dimension`].
pub async fn add_dimension<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DimensionBody>,
) -> Result<impl IntoResponse, ApiError> {
  let dim = engine
    .store()
    .add_dimension(NewDimension {
      area_id:        id,
      code:           body.code,
      name:           body.name,
      weight_default: body.weight_default,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(dim)))
}

// ─── Custom weights ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WeightBody {
  pub user_id: Uuid,
  pub weight:  f64,
}

#[derive(Debug, Serialize)]
pub struct WeightView {
  pub user_id: Uuid,
  pub area_id: Uuid,
  pub weight:  f64,
}

/// `PUT /areas/:id/weight`
pub async fn set_weight<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<WeightBody>,
) -> Result<Json<WeightView>, ApiError> {
  engine
    .store()
    .set_custom_weight(body.user_id, id, body.weight)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(WeightView { user_id: body.user_id, area_id: id, weight: body.weight }))
}

/// `DELETE /areas/:id/weight?user_id=<id>`: 204, or 404 if no custom weight
/// was set.
pub async fn clear_weight<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<UserParams>,
) -> Result<StatusCode, ApiError> {
  let removed = engine
    .store()
    .delete_custom_weight(params.user_id, id)
    .await
    .map_err(ApiError::store)?;
  if removed {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("no custom weight for area {id}")))
  }
}

// ─── Single-area rollup ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RollupParams {
  pub user_id: Uuid,
  pub period:  String,
}

#[derive(Debug, Serialize)]
pub struct AreaRollupView {
  pub area_id:   Uuid,
  pub period:    Period,
  pub score:     f64,
  pub trend_30d: f64,
  pub no_data:   bool,
  pub strategy:  ScoringStrategy,
}

impl AreaRollupView {
  fn new(area_id: Uuid, period: Period, outcome: AreaOutcome) -> Self {
    Self {
      area_id,
      period,
      score: outcome.score.value(),
      trend_30d: outcome.trend_30d,
      no_data: outcome.score.is_no_data(),
      strategy: outcome.score.strategy(),
    }
  }
}

/// `GET /areas/:id/rollup?user_id=<id>&period=YYYY-MM`
pub async fn rollup<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<RollupParams>,
) -> Result<Json<AreaRollupView>, ApiError> {
  let period = Period::parse(&params.period, None)?;
  let outcome = engine.compute_area_rollup(params.user_id, id, period).await?;
  Ok(Json(AreaRollupView::new(id, period, outcome)))
}
