//! [`FulfillmentEngine`]: turns raw signals into rollups.
//!
//! A full rollup for (user, period) runs strictly in sequence:
//!
//! 1. parse the period (fail fast, before any I/O);
//! 2. load the user's areas and resolve their weights;
//! 3. compute live ritual impact for the period;
//! 4. score each area through the strategy ladder and compute its trend;
//! 5. compute confidence and the GFS;
//! 6. persist the summary and every area row in one atomic write.
//!
//! The engine never retries store failures and never writes a partial
//! rollup.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
  Error, Result,
  area::{Area, WeightedArea, resolve_weight},
  period::{Period, PeriodType},
  rollup::{AreaOutcome, AreaReport, AreaRollup, AreaScore, PeriodSummary, RollupReport},
  score::{
    self, NoDataPolicy, RitualImpactReport,
    aggregate::{AreaSignals, score_area},
    coverage_confidence,
    trend::{TREND_WINDOW_DAYS, trend_30d},
  },
  signal::{RITUAL_SCORE_CONFIDENCE, RawScore, ScoreSource, ritual_score_id},
  store::FulfillmentStore,
};

/// Tunables for the engine, deserialised from the `[engine]` config table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
  #[serde(default)]
  pub no_data_policy: NoDataPolicy,
}

/// Computes and persists fulfillment rollups over any [`FulfillmentStore`].
pub struct FulfillmentEngine<S> {
  store:  Arc<S>,
  config: EngineConfig,
}

impl<S> Clone for FulfillmentEngine<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), config: self.config } }
}

impl<S: FulfillmentStore> FulfillmentEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self::with_config(store, EngineConfig::default()) }

  pub fn with_config(store: Arc<S>, config: EngineConfig) -> Self { Self { store, config } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> EngineConfig { self.config }

  // ── Areas ─────────────────────────────────────────────────────────────────

  /// The user's active areas in evaluation order (code, then id), each with
  /// its resolved weight.
  pub async fn weighted_areas(&self, user_id: Uuid) -> Result<Vec<WeightedArea>> {
    let mut areas = self.store.list_areas(user_id).await.map_err(Error::store)?;
    areas.sort_by(|a, b| a.code.cmp(&b.code).then(a.area_id.cmp(&b.area_id)));

    let mut weighted = Vec::with_capacity(areas.len());
    for area in areas {
      let custom = self
        .store
        .get_custom_weight(user_id, area.area_id)
        .await
        .map_err(Error::store)?;
      let weight = resolve_weight(&area, custom);
      if weight.is_none() {
        tracing::warn!(
          %user_id,
          area = %area.code,
          "area has no resolvable weight; leaving it out of the GFS"
        );
      }
      weighted.push(WeightedArea { area, weight });
    }
    Ok(weighted)
  }

  // ── Ritual impact ─────────────────────────────────────────────────────────

  /// Live ritual impact for the user's active rituals over `period`.
  pub async fn compute_ritual_impact(
    &self,
    user_id: Uuid,
    period: Period,
  ) -> Result<RitualImpactReport> {
    let rituals = self.store.list_active_rituals(user_id).await.map_err(Error::store)?;
    let sessions = self
      .store
      .query_ritual_sessions(user_id, period.range())
      .await
      .map_err(Error::store)?;
    Ok(score::compute_ritual_impact(&rituals, &sessions, period))
  }

  /// Compute ritual impact and record it as one system-estimated raw score
  /// per impacted area. Re-running for the same period replaces the whole
  /// set, so areas that lost their sessions also lose their estimate.
  pub async fn persist_ritual_impact(
    &self,
    user_id: Uuid,
    period: Period,
  ) -> Result<RitualImpactReport> {
    let report = self.compute_ritual_impact(user_id, period).await?;
    let visible = self.store.list_areas(user_id).await.map_err(Error::store)?;

    let mut scores = Vec::with_capacity(report.impacts.len());
    for impact in &report.impacts {
      if !visible.iter().any(|a| a.area_id == impact.area_id) {
        tracing::warn!(%user_id, area_id = %impact.area_id, "ritual feeds an unknown area; skipping");
        continue;
      }
      scores.push(RawScore {
        score_id:     ritual_score_id(user_id, impact.area_id, period),
        user_id,
        area_id:      impact.area_id,
        dimension_id: None,
        score:        impact.impact_score,
        recorded_at:  period.last_instant(),
        source:       ScoreSource::RitualTracking,
        confidence:   Some(RITUAL_SCORE_CONFIDENCE),
        metadata:     Some(json!({
          "period":            period,
          "completion_rate":   impact.completion_rate,
          "consistency_bonus": impact.consistency_bonus,
          "quality_average":   impact.quality_average,
          "sessions_count":    impact.sessions_count,
          "ritual_ids":        impact.ritual_ids,
          "reasoning":         impact.reasoning,
        })),
      });
    }
    self
      .store
      .replace_ritual_scores(user_id, period, scores)
      .await
      .map_err(Error::store)?;

    tracing::info!(
      %user_id,
      %period,
      areas = report.impacts.len(),
      sessions = report.total_sessions,
      "persisted ritual impact"
    );
    Ok(report)
  }

  // ── Single area ───────────────────────────────────────────────────────────

  /// Score one area for one period without persisting anything. The area
  /// must be active and visible to `user_id`.
  pub async fn compute_area_rollup(
    &self,
    user_id: Uuid,
    area_id: Uuid,
    period: Period,
  ) -> Result<AreaOutcome> {
    let area = self
      .store
      .get_area(area_id)
      .await
      .map_err(Error::store)?
      .filter(|a| a.active && a.owner_id.is_none_or(|o| o == user_id))
      .ok_or(Error::AreaNotFound(area_id))?;
    let rituals = self.compute_ritual_impact(user_id, period).await?;
    self.evaluate_area(user_id, &area, period, &rituals).await
  }

  async fn evaluate_area(
    &self,
    user_id: Uuid,
    area: &Area,
    period: Period,
    rituals: &RitualImpactReport,
  ) -> Result<AreaOutcome> {
    let range = period.range();
    let raw_scores = self
      .store
      .query_raw_scores(user_id, area.area_id, range)
      .await
      .map_err(Error::store)?;

    let dimensions = if raw_scores.is_empty() {
      Vec::new()
    } else {
      self.store.list_dimensions(area.area_id).await.map_err(Error::store)?
    };

    let ritual_impact = rituals.impact_for(area.area_id).map(|i| i.impact_score);

    // Entry links only matter when nothing stronger exists.
    let entry_links = if raw_scores.is_empty() && ritual_impact.is_none() {
      self
        .store
        .query_entry_links(user_id, area.area_id, range)
        .await
        .map_err(Error::store)?
    } else {
      Vec::new()
    };

    let score = score_area(&AreaSignals {
      raw_scores:  &raw_scores,
      dimensions:  &dimensions,
      ritual_impact,
      entry_links: &entry_links,
    });

    let trend = if score.is_no_data() {
      0.0
    } else {
      let window = range.trailing(TREND_WINDOW_DAYS);
      let window_scores = self
        .store
        .query_raw_scores(user_id, area.area_id, window)
        .await
        .map_err(Error::store)?;
      trend_30d(&window_scores, window)
    };

    tracing::debug!(
      %user_id,
      area = %area.code,
      strategy = %score.strategy(),
      score = score.value(),
      trend = trend,
      "scored area"
    );

    Ok(AreaOutcome { score, trend_30d: trend })
  }

  // ── GFS ───────────────────────────────────────────────────────────────────

  /// GFS over `areas` under the configured [`NoDataPolicy`].
  pub fn compute_gfs(
    &self,
    areas: &[WeightedArea],
    area_scores: &HashMap<Uuid, AreaScore>,
  ) -> f64 {
    score::compute_gfs(areas, area_scores, self.config.no_data_policy)
  }

  // ── Full rollup ───────────────────────────────────────────────────────────

  /// Compute, persist and return the rollup for (user, period).
  pub async fn run_full_rollup(
    &self,
    user_id: Uuid,
    period: &str,
    period_type: Option<PeriodType>,
  ) -> Result<RollupReport> {
    self.run_full_rollup_at(user_id, period, period_type, Utc::now()).await
  }

  /// As [`run_full_rollup`](Self::run_full_rollup), stamping the summary
  /// with `now`. Area rows depend only on the facts.
  pub async fn run_full_rollup_at(
    &self,
    user_id: Uuid,
    period: &str,
    period_type: Option<PeriodType>,
    now: DateTime<Utc>,
  ) -> Result<RollupReport> {
    let period = Period::parse(period, period_type)?;

    let areas = self.weighted_areas(user_id).await?;
    let rituals = self.compute_ritual_impact(user_id, period).await?;

    let mut outcomes = Vec::with_capacity(areas.len());
    for wa in &areas {
      outcomes.push(self.evaluate_area(user_id, &wa.area, period, &rituals).await?);
    }

    let area_scores: HashMap<Uuid, AreaScore> = areas
      .iter()
      .zip(&outcomes)
      .map(|(wa, o)| (wa.area.area_id, o.score))
      .collect();
    let all_scores: Vec<AreaScore> = outcomes.iter().map(|o| o.score).collect();
    let confidence = coverage_confidence(&all_scores);
    let gfs = self.compute_gfs(&areas, &area_scores);

    let rows: Vec<AreaRollup> = areas
      .iter()
      .zip(&outcomes)
      .map(|(wa, o)| AreaRollup {
        user_id,
        area_id: wa.area.area_id,
        period,
        score: o.score.value(),
        trend_30d: o.trend_30d,
        strategy: o.score.strategy(),
        weight: wa.weight,
      })
      .collect();
    let summary = PeriodSummary { user_id, period, gfs, confidence, computed_at: now };

    self.store.save_rollup(summary, rows).await.map_err(Error::store)?;

    tracing::info!(%user_id, %period, gfs, confidence, areas = areas.len(), "rollup complete");

    Ok(RollupReport {
      period,
      gfs,
      confidence,
      computed_at: now,
      areas: areas
        .iter()
        .zip(&outcomes)
        .map(|(wa, o)| AreaReport {
          area_id:   wa.area.area_id,
          code:      wa.area.code.clone(),
          name:      wa.area.name.clone(),
          score:     o.score.value(),
          trend_30d: o.trend_30d,
          no_data:   o.score.is_no_data(),
          strategy:  o.score.strategy(),
          weight:    wa.weight,
        })
        .collect(),
    })
  }

  /// Read back a persisted rollup. Returns `None` if none was computed.
  pub async fn load_rollup(&self, user_id: Uuid, period: Period) -> Result<Option<RollupReport>> {
    let Some(summary) = self.store.get_summary(user_id, period).await.map_err(Error::store)? else {
      return Ok(None);
    };
    let rows = self
      .store
      .list_area_rollups(user_id, period)
      .await
      .map_err(Error::store)?;

    let mut areas = Vec::with_capacity(rows.len());
    for row in rows {
      let area = self.store.get_area(row.area_id).await.map_err(Error::store)?;
      let (code, name) = match area {
        Some(a) => (a.code, a.name),
        None => (row.area_id.to_string(), String::new()),
      };
      areas.push(AreaReport {
        area_id: row.area_id,
        code,
        name,
        score: row.score,
        trend_30d: row.trend_30d,
        no_data: row.no_data(),
        strategy: row.strategy,
        weight: row.weight,
      });
    }
    areas.sort_by(|a, b| a.code.cmp(&b.code).then(a.area_id.cmp(&b.area_id)));

    Ok(Some(RollupReport {
      period,
      gfs: summary.gfs,
      confidence: summary.confidence,
      computed_at: summary.computed_at,
      areas,
    }))
  }
}
