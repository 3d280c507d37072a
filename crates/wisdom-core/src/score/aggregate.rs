//! Per-area score aggregation.
//!
//! Reduces the signals for one (user, area, period) to a single 0–5 score via
//! an explicit [`ScoringStrategy`] ladder: raw scores, then live ritual
//! impact, then entry links, then no data.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{
  area::Dimension,
  rollup::{AreaScore, ScoringStrategy},
  score::round2,
  signal::{EntryLink, RawScore},
};

/// Weight of the implicit group formed by scores without a dimension.
pub const UNDIMENSIONED_WEIGHT: f64 = 1.0;

/// Starting point of the entry-link estimate before volume and strength.
pub const ENTRY_LINK_BASE: f64 = 2.0;

/// Everything known about one area for one period.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaSignals<'a> {
  pub raw_scores:    &'a [RawScore],
  pub dimensions:    &'a [Dimension],
  /// The area's live ritual impact score, if any ritual fed it.
  pub ritual_impact: Option<f64>,
  pub entry_links:   &'a [EntryLink],
}

impl AreaSignals<'_> {
  pub fn strategy(&self) -> ScoringStrategy {
    ScoringStrategy::select(
      !self.raw_scores.is_empty(),
      self.ritual_impact.is_some(),
      !self.entry_links.is_empty(),
    )
  }
}

/// Score one area, rounded to two decimals.
pub fn score_area(signals: &AreaSignals<'_>) -> AreaScore {
  let strategy = signals.strategy();
  let value = match strategy {
    ScoringStrategy::RawScores => score_raw_scores(signals.raw_scores, signals.dimensions),
    ScoringStrategy::RitualImpact => signals.ritual_impact.unwrap_or_default(),
    ScoringStrategy::EntryLinks => score_entry_links(signals.entry_links),
    ScoringStrategy::NoData => return AreaScore::NoData,
  };
  AreaScore::Scored { value: round2(value.clamp(0.0, 5.0)), strategy }
}

/// Weighted mean of per-dimension means.
///
/// Scores are grouped by dimension, each group is averaged, and the group
/// means are combined with the dimension's `weight_default`. Undimensioned
/// scores form one group of weight [`UNDIMENSIONED_WEIGHT`]. Scores pointing
/// at a dimension not listed for the area are ignored. A zero total weight
/// yields `0.0`.
pub fn score_raw_scores(scores: &[RawScore], dimensions: &[Dimension]) -> f64 {
  let mut groups: BTreeMap<Option<Uuid>, (f64, usize)> = BTreeMap::new();
  for s in scores {
    let entry = groups.entry(s.dimension_id).or_insert((0.0, 0));
    entry.0 += s.score;
    entry.1 += 1;
  }

  let mut weighted_sum = 0.0;
  let mut total_weight = 0.0;
  for (dimension_id, (sum, count)) in groups {
    let weight = match dimension_id {
      None => UNDIMENSIONED_WEIGHT,
      Some(id) => match dimensions.iter().find(|d| d.dimension_id == id) {
        Some(d) => d.weight_default,
        None => {
          tracing::warn!(dimension_id = %id, "ignoring scores for unknown dimension");
          continue;
        }
      },
    };
    weighted_sum += (sum / count as f64) * weight;
    total_weight += weight;
  }

  if total_weight <= 0.0 {
    return 0.0;
  }
  weighted_sum / total_weight
}

/// Bonus added to [`ENTRY_LINK_BASE`] for the number of links in period.
pub fn link_volume_bonus(count: usize) -> f64 {
  match count {
    0..=1 => 0.0,
    2..=4 => 0.5,
    5..=9 => 1.0,
    _ => 1.5,
  }
}

/// Estimate from indirect mentions: `(base + volume bonus) × mean strength`,
/// capped at 5.
pub fn score_entry_links(links: &[EntryLink]) -> f64 {
  if links.is_empty() {
    return 0.0;
  }
  let mean_strength = links.iter().map(|l| l.strength).sum::<f64>() / links.len() as f64;
  ((ENTRY_LINK_BASE + link_volume_bonus(links.len())) * mean_strength).min(5.0)
}
