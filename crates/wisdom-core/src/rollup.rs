//! Rollup records: derived, recomputable caches of scoring output.
//!
//! Nothing here is a source of truth. Every value can be rebuilt from raw
//! signals at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::Period;

// ─── Strategy & tagged score ─────────────────────────────────────────────────

/// Which signal produced an area score for a period.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoringStrategy {
  /// Weighted mean of dimension means over raw scores.
  RawScores,
  /// Live ritual impact for the area.
  RitualImpact,
  /// Volume- and strength-based estimate from entry links.
  EntryLinks,
  /// No signal of any kind.
  NoData,
}

impl ScoringStrategy {
  /// Pick the strategy for one area/period. Raw scores always dominate, then
  /// ritual impact, then entry links.
  pub fn select(has_raw_scores: bool, has_ritual_impact: bool, has_entry_links: bool) -> Self {
    if has_raw_scores {
      Self::RawScores
    } else if has_ritual_impact {
      Self::RitualImpact
    } else if has_entry_links {
      Self::EntryLinks
    } else {
      Self::NoData
    }
  }
}

/// An area's score, keeping "no data" apart from a genuine zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AreaScore {
  Scored { value: f64, strategy: ScoringStrategy },
  NoData,
}

impl AreaScore {
  /// The numeric score; `0.0` when there is no data.
  pub fn value(&self) -> f64 {
    match self {
      Self::Scored { value, .. } => *value,
      Self::NoData => 0.0,
    }
  }

  pub fn strategy(&self) -> ScoringStrategy {
    match self {
      Self::Scored { strategy, .. } => *strategy,
      Self::NoData => ScoringStrategy::NoData,
    }
  }

  pub fn is_no_data(&self) -> bool { matches!(self, Self::NoData) }
}

/// Output of computing one area for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaOutcome {
  pub score:     AreaScore,
  pub trend_30d: f64,
}

// ─── Persisted rows ──────────────────────────────────────────────────────────

/// One row per (user, area, period). Carries no timestamp: the same facts
/// always produce the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRollup {
  pub user_id:   Uuid,
  pub area_id:   Uuid,
  pub period:    Period,
  /// 0–5, rounded to two decimals.
  pub score:     f64,
  pub trend_30d: f64,
  pub strategy:  ScoringStrategy,
  /// The weight that applied; `None` if the area was left out of the GFS.
  pub weight:    Option<f64>,
}

impl AreaRollup {
  pub fn no_data(&self) -> bool { self.strategy == ScoringStrategy::NoData }
}

/// One row per (user, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
  pub user_id:     Uuid,
  pub period:      Period,
  /// 0–100.
  pub gfs:         f64,
  /// 0–1, share of evaluated areas with a positive score.
  pub confidence:  f64,
  pub computed_at: DateTime<Utc>,
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// One area line in a [`RollupReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaReport {
  pub area_id:   Uuid,
  pub code:      String,
  pub name:      String,
  pub score:     f64,
  pub trend_30d: f64,
  pub no_data:   bool,
  pub strategy:  ScoringStrategy,
  /// The weight that applied; `None` if the area was left out of the GFS.
  pub weight:    Option<f64>,
}

/// The result of a full rollup, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupReport {
  pub period:      Period,
  pub gfs:         f64,
  pub confidence:  f64,
  pub computed_at: DateTime<Utc>,
  pub areas:       Vec<AreaReport>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn raw_scores_dominate_everything() {
    assert_eq!(ScoringStrategy::select(true, true, true), ScoringStrategy::RawScores);
    assert_eq!(ScoringStrategy::select(true, false, false), ScoringStrategy::RawScores);
  }

  #[test]
  fn fallback_order() {
    assert_eq!(ScoringStrategy::select(false, true, true), ScoringStrategy::RitualImpact);
    assert_eq!(ScoringStrategy::select(false, false, true), ScoringStrategy::EntryLinks);
    assert_eq!(ScoringStrategy::select(false, false, false), ScoringStrategy::NoData);
  }

  #[test]
  fn no_data_is_distinct_from_zero() {
    let zero = AreaScore::Scored { value: 0.0, strategy: ScoringStrategy::RawScores };
    assert_eq!(zero.value(), AreaScore::NoData.value());
    assert_ne!(zero, AreaScore::NoData);
    assert!(AreaScore::NoData.is_no_data());
    assert!(!zero.is_no_data());
  }
}
