//! Handlers for `/rituals` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rituals` | `?user_id` required; active rituals only |
//! | `POST` | `/rituals` | Body: [`NewRitual`]; returns 201 |
//! | `POST` | `/rituals/:id/deactivate` | 404 if not found |
//! | `POST` | `/rituals/:id/sessions` | Body: [`SessionBody`]; returns 201 |
//! | `GET`  | `/rituals/impact` | `?user_id&period`; live computation |
//! | `POST` | `/rituals/impact` | Same, and records one system score per area |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use wisdom_core::{
  engine::FulfillmentEngine,
  period::Period,
  ritual::{NewRitual, NewRitualSession, Ritual},
  score::RitualImpactReport,
  store::FulfillmentStore,
};

use crate::{areas::UserParams, error::ApiError};

// ─── List / create ────────────────────────────────────────────────────────────

/// `GET /rituals?user_id=<id>`
pub async fn list<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Query(params): Query<UserParams>,
) -> Result<Json<Vec<Ritual>>, ApiError> {
  let rituals = engine
    .store()
    .list_active_rituals(params.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rituals))
}

/// `POST /rituals`
pub async fn create<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Json(body): Json<NewRitual>,
) -> Result<impl IntoResponse, ApiError> {
  let ritual = engine.store().add_ritual(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(ritual)))
}

// ─── Deactivate ───────────────────────────────────────────────────────────────

/// `POST /rituals/:id/deactivate`. Sessions stay; the ritual stops counting.
pub async fn deactivate<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Ritual>, ApiError> {
  let ritual = engine
    .store()
    .deactivate_ritual(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("ritual {id} not found")))?;
  Ok(Json(ritual))
}

// ─── Sessions ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /rituals/:id/sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct SessionBody {
  /// Defaults to the time of recording.
  pub completed_at:     Option<DateTime<Utc>>,
  pub duration_minutes: Option<u32>,
  pub quality:          Option<u8>,
  pub notes:            Option<String>,
}

/// `POST /rituals/:id/sessions`
pub async fn record_session<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<SessionBody>,
) -> Result<impl IntoResponse, ApiError> {
  let session = engine
    .store()
    .record_ritual_session(NewRitualSession {
      ritual_id:        id,
      completed_at:     body.completed_at,
      duration_minutes: body.duration_minutes,
      quality:          body.quality,
      notes:            body.notes,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(session)))
}

// ─── Impact ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImpactParams {
  pub user_id: Uuid,
  pub period:  String,
}

/// `GET /rituals/impact?user_id=<id>&period=YYYY-MM`
pub async fn impact<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Query(params): Query<ImpactParams>,
) -> Result<Json<RitualImpactReport>, ApiError> {
  let period = Period::parse(&params.period, None)?;
  let report = engine.compute_ritual_impact(params.user_id, period).await?;
  Ok(Json(report))
}

/// `POST /rituals/impact`, body: `{"user_id":..,"period":".."}`
pub async fn persist_impact<S: FulfillmentStore>(
  State(engine): State<FulfillmentEngine<S>>,
  Json(body): Json<ImpactParams>,
) -> Result<Json<RitualImpactReport>, ApiError> {
  let period = Period::parse(&body.period, None)?;
  let report = engine.persist_ritual_impact(body.user_id, period).await?;
  Ok(Json(report))
}
