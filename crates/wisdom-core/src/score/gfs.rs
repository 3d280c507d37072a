//! Global Fulfillment Score.
//!
//! `GFS = Σ(score × weight) / Σ(weight) × 20`, on a 0–100 scale. Areas
//! without a resolvable weight are left out of both sums.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{area::WeightedArea, rollup::AreaScore, score::round2};

/// How areas without any signal enter the GFS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataPolicy {
  /// The area counts as a score of 0 with its full weight.
  #[default]
  CountAsZero,
  /// The area is left out of numerator and denominator.
  Exclude,
}

/// Combine area scores into a 0–100 figure, rounded to two decimals.
///
/// Areas missing from `area_scores` were not evaluated and are skipped. A zero
/// total weight gives `0.0`.
pub fn compute_gfs(
  areas: &[WeightedArea],
  area_scores: &HashMap<Uuid, AreaScore>,
  policy: NoDataPolicy,
) -> f64 {
  let mut weighted_sum = 0.0;
  let mut total_weight = 0.0;

  for wa in areas {
    let Some(weight) = wa.weight else {
      continue;
    };
    let Some(score) = area_scores.get(&wa.area.area_id) else {
      continue;
    };
    if policy == NoDataPolicy::Exclude && score.is_no_data() {
      continue;
    }
    weighted_sum += score.value() * weight;
    total_weight += weight;
  }

  if total_weight <= 0.0 {
    return 0.0;
  }
  round2((weighted_sum / total_weight * 20.0).clamp(0.0, 100.0))
}
