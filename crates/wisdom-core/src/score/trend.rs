//! Trend and confidence estimation.

use crate::{period::TimeRange, rollup::AreaScore, score::round2, signal::RawScore};

/// Length of the trend window, in days.
pub const TREND_WINDOW_DAYS: i64 = 30;

/// Two-point trend: the latest score minus the earliest score among those
/// strictly inside `window`. Fewer than two points gives `0.0`.
///
/// This is a slope proxy, not a regression.
pub fn trend_30d(scores: &[RawScore], window: TimeRange) -> f64 {
  let mut points: Vec<&RawScore> = scores
    .iter()
    .filter(|s| window.start < s.recorded_at && s.recorded_at < window.end)
    .collect();
  if points.len() < 2 {
    return 0.0;
  }
  points.sort_by_key(|s| (s.recorded_at, s.score_id));
  match (points.first(), points.last()) {
    (Some(first), Some(last)) => round2(last.score - first.score),
    _ => 0.0,
  }
}

/// Data coverage: the share of evaluated areas whose score is positive.
/// No areas gives `0.0`.
pub fn coverage_confidence(scores: &[AreaScore]) -> f64 {
  if scores.is_empty() {
    return 0.0;
  }
  let covered = scores.iter().filter(|s| s.value() > 0.0).count();
  round2(covered as f64 / scores.len() as f64)
}
