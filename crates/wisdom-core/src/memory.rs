//! [`MemoryStore`], an in-process implementation of [`FulfillmentStore`].
//!
//! Used by tests and by callers that want to run the engine over data they
//! already hold. State lives behind a single [`RwLock`], so a
//! [`save_rollup`](FulfillmentStore::save_rollup) is one write-lock critical
//! section and therefore atomic.

use std::{
  collections::{BTreeMap, HashMap},
  sync::Arc,
};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
  Error, Result,
  area::{Area, Dimension, NewArea, NewDimension, validate_weight},
  period::{Period, TimeRange},
  ritual::{NewRitual, NewRitualSession, Ritual, RitualSession},
  rollup::{AreaRollup, PeriodSummary},
  signal::{EntryLink, NewEntryLink, NewRawScore, RawScore, ScoreSource, ritual_score_id},
  store::FulfillmentStore,
};

#[derive(Default)]
struct State {
  areas:          BTreeMap<Uuid, Area>,
  custom_weights: HashMap<(Uuid, Uuid), f64>,
  dimensions:     BTreeMap<Uuid, Dimension>,
  raw_scores:     BTreeMap<Uuid, RawScore>,
  entry_links:    Vec<EntryLink>,
  rituals:        BTreeMap<Uuid, Ritual>,
  sessions:       Vec<RitualSession>,
  summaries:      HashMap<(Uuid, Period), PeriodSummary>,
  area_rollups:   BTreeMap<(Uuid, Period, Uuid), AreaRollup>,
}

/// A fulfillment store held entirely in memory.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<RwLock<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl State {
  fn require_area(&self, area_id: Uuid) -> Result<()> {
    if self.areas.contains_key(&area_id) {
      Ok(())
    } else {
      Err(Error::AreaNotFound(area_id))
    }
  }

  fn require_dimension(&self, area_id: Uuid, dimension_id: Option<Uuid>) -> Result<()> {
    match dimension_id {
      Some(id) if self.dimensions.get(&id).is_none_or(|d| d.area_id != area_id) => {
        Err(Error::DimensionNotFound(id))
      }
      _ => Ok(()),
    }
  }
}

impl FulfillmentStore for MemoryStore {
  type Error = Error;

  // ── Areas & weights ───────────────────────────────────────────────────────

  async fn add_area(&self, input: NewArea) -> Result<Area> {
    input.validate()?;
    let area = Area {
      area_id:        Uuid::new_v4(),
      code:           input.code,
      name:           input.name,
      default_weight: input.default_weight,
      owner_id:       input.owner_id,
      active:         true,
      created_at:     Utc::now(),
    };
    self.state.write().await.areas.insert(area.area_id, area.clone());
    Ok(area)
  }

  async fn get_area(&self, area_id: Uuid) -> Result<Option<Area>> {
    Ok(self.state.read().await.areas.get(&area_id).cloned())
  }

  async fn list_areas(&self, user_id: Uuid) -> Result<Vec<Area>> {
    let state = self.state.read().await;
    Ok(
      state
        .areas
        .values()
        .filter(|a| a.active && a.owner_id.is_none_or(|o| o == user_id))
        .cloned()
        .collect(),
    )
  }

  async fn set_custom_weight(&self, user_id: Uuid, area_id: Uuid, weight: f64) -> Result<()> {
    validate_weight(weight)?;
    let mut state = self.state.write().await;
    state.require_area(area_id)?;
    state.custom_weights.insert((user_id, area_id), weight);
    Ok(())
  }

  async fn get_custom_weight(&self, user_id: Uuid, area_id: Uuid) -> Result<Option<f64>> {
    Ok(self.state.read().await.custom_weights.get(&(user_id, area_id)).copied())
  }

  async fn delete_custom_weight(&self, user_id: Uuid, area_id: Uuid) -> Result<bool> {
    Ok(self.state.write().await.custom_weights.remove(&(user_id, area_id)).is_some())
  }

  async fn add_dimension(&self, input: NewDimension) -> Result<Dimension> {
    input.validate()?;
    let mut state = self.state.write().await;
    state.require_area(input.area_id)?;
    let dimension = Dimension {
      dimension_id:   Uuid::new_v4(),
      area_id:        input.area_id,
      code:           input.code,
      name:           input.name,
      weight_default: input.weight_default,
    };
    state.dimensions.insert(dimension.dimension_id, dimension.clone());
    Ok(dimension)
  }

  async fn list_dimensions(&self, area_id: Uuid) -> Result<Vec<Dimension>> {
    let state = self.state.read().await;
    Ok(state.dimensions.values().filter(|d| d.area_id == area_id).cloned().collect())
  }

  // ── Raw signals ───────────────────────────────────────────────────────────

  async fn record_raw_score(&self, input: NewRawScore) -> Result<RawScore> {
    input.validate()?;
    let mut state = self.state.write().await;
    state.require_area(input.area_id)?;
    state.require_dimension(input.area_id, input.dimension_id)?;
    let score = input.into_raw_score(Utc::now());
    state.raw_scores.insert(score.score_id, score.clone());
    Ok(score)
  }

  async fn replace_ritual_scores(
    &self,
    user_id: Uuid,
    period: Period,
    scores: Vec<RawScore>,
  ) -> Result<()> {
    if let Some(bad) = scores.iter().find(|s| !(0.0..=5.0).contains(&s.score)) {
      return Err(Error::InvalidScore(bad.score));
    }
    let stamp = period.last_instant();
    let mut state = self.state.write().await;
    state.raw_scores.retain(|id, s| {
      !(s.user_id == user_id
        && s.source == ScoreSource::RitualTracking
        && s.recorded_at == stamp
        && *id == ritual_score_id(user_id, s.area_id, period))
    });
    for score in scores {
      state.raw_scores.insert(score.score_id, score);
    }
    Ok(())
  }

  async fn query_raw_scores(
    &self,
    user_id: Uuid,
    area_id: Uuid,
    range: TimeRange,
  ) -> Result<Vec<RawScore>> {
    let state = self.state.read().await;
    let mut rows: Vec<RawScore> = state
      .raw_scores
      .values()
      .filter(|s| s.user_id == user_id && s.area_id == area_id && range.contains(s.recorded_at))
      .cloned()
      .collect();
    rows.sort_by_key(|s| (s.recorded_at, s.score_id));
    Ok(rows)
  }

  async fn record_entry_link(&self, input: NewEntryLink) -> Result<EntryLink> {
    input.validate()?;
    let mut state = self.state.write().await;
    state.require_area(input.area_id)?;
    let link = input.into_entry_link(Utc::now());
    state.entry_links.push(link.clone());
    Ok(link)
  }

  async fn query_entry_links(
    &self,
    user_id: Uuid,
    area_id: Uuid,
    range: TimeRange,
  ) -> Result<Vec<EntryLink>> {
    let state = self.state.read().await;
    let mut rows: Vec<EntryLink> = state
      .entry_links
      .iter()
      .filter(|l| l.user_id == user_id && l.area_id == area_id && range.contains(l.recorded_at))
      .cloned()
      .collect();
    rows.sort_by_key(|l| (l.recorded_at, l.link_id));
    Ok(rows)
  }

  // ── Rituals ───────────────────────────────────────────────────────────────

  async fn add_ritual(&self, input: NewRitual) -> Result<Ritual> {
    let mut area_ids = input.area_ids;
    area_ids.sort();
    area_ids.dedup();

    let ritual = Ritual {
      ritual_id:  Uuid::new_v4(),
      user_id:    input.user_id,
      name:       input.name,
      cadence:    input.cadence,
      area_ids,
      active:     true,
      created_at: Utc::now(),
    };
    self.state.write().await.rituals.insert(ritual.ritual_id, ritual.clone());
    Ok(ritual)
  }

  async fn get_ritual(&self, ritual_id: Uuid) -> Result<Option<Ritual>> {
    Ok(self.state.read().await.rituals.get(&ritual_id).cloned())
  }

  async fn deactivate_ritual(&self, ritual_id: Uuid) -> Result<Option<Ritual>> {
    let mut state = self.state.write().await;
    Ok(state.rituals.get_mut(&ritual_id).map(|r| {
      r.active = false;
      r.clone()
    }))
  }

  async fn list_active_rituals(&self, user_id: Uuid) -> Result<Vec<Ritual>> {
    let state = self.state.read().await;
    let mut rituals: Vec<Ritual> = state
      .rituals
      .values()
      .filter(|r| r.active && r.user_id == user_id)
      .cloned()
      .collect();
    rituals.sort_by(|a, b| a.name.cmp(&b.name).then(a.ritual_id.cmp(&b.ritual_id)));
    Ok(rituals)
  }

  async fn record_ritual_session(&self, input: NewRitualSession) -> Result<RitualSession> {
    input.validate()?;
    let mut state = self.state.write().await;
    let owner = state
      .rituals
      .get(&input.ritual_id)
      .map(|r| r.user_id)
      .ok_or(Error::RitualNotFound(input.ritual_id))?;
    let session = input.into_session(owner, Utc::now());
    state.sessions.push(session.clone());
    Ok(session)
  }

  async fn query_ritual_sessions(
    &self,
    user_id: Uuid,
    range: TimeRange,
  ) -> Result<Vec<RitualSession>> {
    let state = self.state.read().await;
    let mut rows: Vec<RitualSession> = state
      .sessions
      .iter()
      .filter(|s| s.user_id == user_id && range.contains(s.completed_at))
      .cloned()
      .collect();
    rows.sort_by_key(|s| (s.completed_at, s.session_id));
    Ok(rows)
  }

  // ── Rollups ───────────────────────────────────────────────────────────────

  async fn save_rollup(&self, summary: PeriodSummary, areas: Vec<AreaRollup>) -> Result<()> {
    let (user_id, period) = (summary.user_id, summary.period);
    let mut state = self.state.write().await;
    state
      .area_rollups
      .retain(|(u, p, _), _| !(*u == user_id && *p == period));
    for row in areas {
      state.area_rollups.insert((row.user_id, row.period, row.area_id), row);
    }
    state.summaries.insert((user_id, period), summary);
    Ok(())
  }

  async fn get_summary(&self, user_id: Uuid, period: Period) -> Result<Option<PeriodSummary>> {
    Ok(self.state.read().await.summaries.get(&(user_id, period)).cloned())
  }

  async fn list_area_rollups(&self, user_id: Uuid, period: Period) -> Result<Vec<AreaRollup>> {
    let state = self.state.read().await;
    Ok(
      state
        .area_rollups
        .iter()
        .filter(|((u, p, _), _)| *u == user_id && *p == period)
        .map(|(_, row)| row.clone())
        .collect(),
    )
  }

  async fn delete_rollup(&self, user_id: Uuid, period: Period) -> Result<bool> {
    let mut state = self.state.write().await;
    state
      .area_rollups
      .retain(|(u, p, _), _| !(*u == user_id && *p == period));
    Ok(state.summaries.remove(&(user_id, period)).is_some())
  }
}
