//! Raw signals: the write-once facts the scoring engine reduces.
//!
//! Raw scores and entry links are contributed by collaborators outside the
//! engine (rating forms, the journal). They are never updated in place; the
//! only exception is the system-estimated ritual score, which is keyed per
//! (user, area, period) so recomputation replaces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, period::Period};

/// Confidence attached to scores estimated from ritual completions.
pub const RITUAL_SCORE_CONFIDENCE: f64 = 0.85;

// ─── Raw scores ──────────────────────────────────────────────────────────────

/// Where a raw score came from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoreSource {
  /// Entered by the user.
  #[default]
  Manual,
  /// Estimated from ritual completions.
  RitualTracking,
  /// Brought in from another system.
  Import,
}

/// One submitted score event on the 0–5 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScore {
  pub score_id:     Uuid,
  pub user_id:      Uuid,
  pub area_id:      Uuid,
  pub dimension_id: Option<Uuid>,
  pub score:        f64,
  pub recorded_at:  DateTime<Utc>,
  pub source:       ScoreSource,
  pub confidence:   Option<f64>,
  pub metadata:     Option<serde_json::Value>,
}

/// Input for [`FulfillmentStore::record_raw_score`](crate::store::FulfillmentStore::record_raw_score).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRawScore {
  pub user_id:      Uuid,
  pub area_id:      Uuid,
  #[serde(default)]
  pub dimension_id: Option<Uuid>,
  pub score:        f64,
  /// Defaults to the time of recording.
  #[serde(default)]
  pub recorded_at:  Option<DateTime<Utc>>,
  #[serde(default)]
  pub source:       ScoreSource,
  #[serde(default)]
  pub confidence:   Option<f64>,
  #[serde(default)]
  pub metadata:     Option<serde_json::Value>,
}

impl NewRawScore {
  pub fn new(user_id: Uuid, area_id: Uuid, score: f64) -> Self {
    Self {
      user_id,
      area_id,
      dimension_id: None,
      score,
      recorded_at: None,
      source: ScoreSource::Manual,
      confidence: None,
      metadata: None,
    }
  }

  pub fn validate(&self) -> Result<()> {
    if !(0.0..=5.0).contains(&self.score) {
      return Err(Error::InvalidScore(self.score));
    }
    Ok(())
  }

  /// Build the stored record, assigning an id and defaulting the timestamp.
  pub fn into_raw_score(self, now: DateTime<Utc>) -> RawScore {
    RawScore {
      score_id:     Uuid::new_v4(),
      user_id:      self.user_id,
      area_id:      self.area_id,
      dimension_id: self.dimension_id,
      score:        self.score,
      recorded_at:  self.recorded_at.unwrap_or(now),
      source:       self.source,
      confidence:   self.confidence,
      metadata:     self.metadata,
    }
  }
}

/// The stable id of the ritual-derived score for one (user, area, period).
pub fn ritual_score_id(user_id: Uuid, area_id: Uuid, period: Period) -> Uuid {
  let name = format!("ritual:{user_id}:{area_id}:{period}");
  Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

// ─── Entry links ─────────────────────────────────────────────────────────────

/// A weak association between a free-text entry and an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryLink {
  pub link_id:     Uuid,
  pub user_id:     Uuid,
  pub entry_id:    Uuid,
  pub area_id:     Uuid,
  /// e.g. `"journal"`, `"reflection"`.
  pub entry_kind:  String,
  /// In `[0, 1]`.
  pub strength:    f64,
  pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntryLink {
  pub user_id:     Uuid,
  pub entry_id:    Uuid,
  pub area_id:     Uuid,
  #[serde(default = "default_entry_kind")]
  pub entry_kind:  String,
  pub strength:    f64,
  #[serde(default)]
  pub recorded_at: Option<DateTime<Utc>>,
}

fn default_entry_kind() -> String { "journal".to_owned() }

impl NewEntryLink {
  pub fn validate(&self) -> Result<()> {
    if !(0.0..=1.0).contains(&self.strength) {
      return Err(Error::InvalidStrength(self.strength));
    }
    Ok(())
  }

  pub fn into_entry_link(self, now: DateTime<Utc>) -> EntryLink {
    EntryLink {
      link_id:     Uuid::new_v4(),
      user_id:     self.user_id,
      entry_id:    self.entry_id,
      area_id:     self.area_id,
      entry_kind:  self.entry_kind,
      strength:    self.strength,
      recorded_at: self.recorded_at.unwrap_or(now),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn score_bounds_are_checked() {
    let (u, a) = (Uuid::new_v4(), Uuid::new_v4());
    assert!(NewRawScore::new(u, a, 5.0).validate().is_ok());
    assert!(NewRawScore::new(u, a, 0.0).validate().is_ok());
    assert!(NewRawScore::new(u, a, 5.01).validate().is_err());
    assert!(NewRawScore::new(u, a, f64::NAN).validate().is_err());
  }

  #[test]
  fn ritual_score_id_is_stable_per_period() {
    let (u, a) = (Uuid::new_v4(), Uuid::new_v4());
    let march = Period::Month { year: 2025, month: 3 };
    let april = Period::Month { year: 2025, month: 4 };
    assert_eq!(ritual_score_id(u, a, march), ritual_score_id(u, a, march));
    assert_ne!(ritual_score_id(u, a, march), ritual_score_id(u, a, april));
  }

  #[test]
  fn source_strings() {
    assert_eq!(ScoreSource::RitualTracking.as_ref(), "ritual_tracking");
    assert_eq!("manual".parse::<ScoreSource>().unwrap(), ScoreSource::Manual);
  }
}
