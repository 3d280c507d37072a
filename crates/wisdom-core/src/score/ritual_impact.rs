//! Ritual impact: how much completed rituals contribute to the areas they
//! feed.
//!
//! Each ritual with at least one session in period is scored on completion
//! rate (70%) and session quality (30%), scaled to 0–5, plus a bonus of up to
//! 0.5 for regular spacing between sessions. A ritual contributes its full
//! score to every area it is linked to; areas fed by several rituals average
//! them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  period::Period,
  ritual::{Cadence, Ritual, RitualSession},
  score::round2,
};

/// Quality assumed when no session in period was rated.
pub const NEUTRAL_QUALITY: f64 = 3.0;

/// Upper bound of the regularity bonus.
pub const MAX_CONSISTENCY_BONUS: f64 = 0.5;

const COMPLETION_SHARE: f64 = 0.7;
const QUALITY_SHARE: f64 = 0.3;
const SECONDS_PER_DAY: f64 = 86_400.0;

// ─── Report types ────────────────────────────────────────────────────────────

/// Impact of a single ritual over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitualImpact {
  pub ritual_id:            Uuid,
  pub name:                 String,
  pub cadence:              Cadence,
  pub area_ids:             Vec<Uuid>,
  pub sessions_count:       usize,
  pub expected_completions: u32,
  pub completion_rate:      f64,
  pub quality_average:      f64,
  pub consistency_bonus:    f64,
  pub impact_score:         f64,
  pub reasoning:            String,
}

/// Combined ritual impact on one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaImpact {
  pub area_id:           Uuid,
  pub impact_score:      f64,
  pub completion_rate:   f64,
  pub consistency_bonus: f64,
  pub quality_average:   f64,
  pub sessions_count:    usize,
  /// Rituals that fed this area.
  pub ritual_ids:        Vec<Uuid>,
  /// Display text only.
  pub reasoning:         String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitualImpactReport {
  pub period:                Period,
  /// One entry per area with at least one session; areas without ritual
  /// signal are absent.
  pub impacts:               Vec<AreaImpact>,
  pub rituals:               Vec<RitualImpact>,
  /// Mean of the per-area impact scores.
  pub overall_ritual_score:  f64,
  pub total_sessions:        usize,
  pub total_rituals_tracked: usize,
}

impl RitualImpactReport {
  pub fn impact_for(&self, area_id: Uuid) -> Option<&AreaImpact> {
    self.impacts.iter().find(|i| i.area_id == area_id)
  }
}

// ─── Building blocks ─────────────────────────────────────────────────────────

/// How many completions a cadence expects over `days` calendar days.
pub fn expected_completions(cadence: Cadence, days: i64) -> u32 {
  let days = days.max(1) as u32;
  match cadence {
    Cadence::Daily => days,
    Cadence::Weekly | Cadence::Custom => days.div_ceil(7),
    Cadence::Monthly => 1,
  }
}

pub fn completion_rate(actual: usize, expected: u32) -> f64 {
  if expected == 0 {
    return 0.0;
  }
  (actual as f64 / expected as f64).min(1.0)
}

/// Mean of the rated sessions, or [`NEUTRAL_QUALITY`] if none were rated.
pub fn quality_average(sessions: &[&RitualSession]) -> f64 {
  let rated: Vec<f64> = sessions.iter().filter_map(|s| s.quality).map(f64::from).collect();
  if rated.is_empty() {
    return NEUTRAL_QUALITY;
  }
  rated.iter().sum::<f64>() / rated.len() as f64
}

/// Regularity bonus in `[0, 0.5]`.
///
/// The mean absolute deviation of the gaps between consecutive sessions is
/// compared with the cadence's expected gap: perfectly even spacing earns the
/// full bonus, a deviation as large as the expected gap earns nothing.
pub fn consistency_bonus(completed_at: &[DateTime<Utc>], cadence: Cadence) -> f64 {
  if completed_at.len() < 2 {
    return 0.0;
  }
  let mut times = completed_at.to_vec();
  times.sort();

  let gaps: Vec<f64> = times
    .windows(2)
    .map(|w| (w[1] - w[0]).num_seconds() as f64 / SECONDS_PER_DAY)
    .collect();
  let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
  let deviation = gaps.iter().map(|g| (g - mean_gap).abs()).sum::<f64>() / gaps.len() as f64;

  let bonus = (1.0 - deviation / cadence.expected_gap_days()).max(0.0) * MAX_CONSISTENCY_BONUS;
  bonus.clamp(0.0, MAX_CONSISTENCY_BONUS)
}

/// `min((rate × 0.7 + quality / 5 × 0.3) × 5 + bonus, 5)`.
pub fn impact_score(completion_rate: f64, quality_average: f64, consistency_bonus: f64) -> f64 {
  let base = (completion_rate * COMPLETION_SHARE + quality_average / 5.0 * QUALITY_SHARE) * 5.0;
  (base + consistency_bonus).min(5.0)
}

/// Human-readable summary of completion and quality bands.
pub fn reasoning(completion_rate: f64, quality_average: f64, sessions: usize) -> String {
  let consistency = if completion_rate >= 0.9 {
    "Exceptional consistency"
  } else if completion_rate >= 0.7 {
    "Strong consistency"
  } else if completion_rate >= 0.5 {
    "Moderate consistency"
  } else {
    "Sporadic completion"
  };
  let quality = if quality_average >= 4.0 {
    "high-quality sessions"
  } else if quality_average >= 3.0 {
    "steady session quality"
  } else {
    "low session quality"
  };
  let noun = if sessions == 1 { "session" } else { "sessions" };
  format!("{consistency} with {quality} ({sessions} {noun})")
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Unrounded per-ritual figures. Area averages are taken over these and
/// rounded once.
#[derive(Debug, Clone, Copy)]
struct Figures {
  rate:    f64,
  quality: f64,
  bonus:   f64,
  impact:  f64,
}

fn figures(ritual: &Ritual, sessions: &[&RitualSession], expected: u32) -> Figures {
  let rate = completion_rate(sessions.len(), expected);
  let quality = quality_average(sessions);
  let times: Vec<DateTime<Utc>> = sessions.iter().map(|s| s.completed_at).collect();
  let bonus = consistency_bonus(&times, ritual.cadence);
  Figures { rate, quality, bonus, impact: impact_score(rate, quality, bonus) }
}

fn scored_ritual(
  ritual: &Ritual,
  sessions: &[&RitualSession],
  days: i64,
) -> (RitualImpact, Figures) {
  let expected = expected_completions(ritual.cadence, days);
  let f = figures(ritual, sessions, expected);
  let impact = RitualImpact {
    ritual_id:            ritual.ritual_id,
    name:                 ritual.name.clone(),
    cadence:              ritual.cadence,
    area_ids:             ritual.area_ids.clone(),
    sessions_count:       sessions.len(),
    expected_completions: expected,
    completion_rate:      round2(f.rate),
    quality_average:      round2(f.quality),
    consistency_bonus:    round2(f.bonus),
    impact_score:         round2(f.impact),
    reasoning:            reasoning(f.rate, f.quality, sessions.len()),
  };
  (impact, f)
}

/// Score one ritual from its sessions in a period of `days` days.
pub fn score_ritual(ritual: &Ritual, sessions: &[&RitualSession], days: i64) -> RitualImpact {
  scored_ritual(ritual, sessions, days).0
}

/// Compute the ritual impact report for one user's rituals and sessions.
///
/// Sessions belonging to rituals not in `rituals` (e.g. deactivated ones) and
/// sessions outside `period` are ignored.
pub fn compute_ritual_impact(
  rituals: &[Ritual],
  sessions: &[RitualSession],
  period: Period,
) -> RitualImpactReport {
  let range = period.range();
  let days = period.days();

  let mut by_ritual: BTreeMap<Uuid, Vec<&RitualSession>> = BTreeMap::new();
  for s in sessions.iter().filter(|s| range.contains(s.completed_at)) {
    by_ritual.entry(s.ritual_id).or_default().push(s);
  }

  let mut ordered: Vec<&Ritual> = rituals.iter().collect();
  ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.ritual_id.cmp(&b.ritual_id)));

  let scored: Vec<(RitualImpact, Figures)> = ordered
    .into_iter()
    .filter_map(|r| {
      let sessions = by_ritual.get(&r.ritual_id).filter(|s| !s.is_empty())?;
      Some(scored_ritual(r, sessions, days))
    })
    .collect();

  let mut by_area: BTreeMap<Uuid, Vec<&(RitualImpact, Figures)>> = BTreeMap::new();
  for entry in &scored {
    for area_id in &entry.0.area_ids {
      by_area.entry(*area_id).or_default().push(entry);
    }
  }

  let mut area_means = Vec::with_capacity(by_area.len());
  let impacts: Vec<AreaImpact> = by_area
    .into_iter()
    .map(|(area_id, contributors)| {
      let n = contributors.len() as f64;
      let mean = |f: fn(&Figures) -> f64| contributors.iter().map(|(_, fig)| f(fig)).sum::<f64>() / n;
      let rate = mean(|f| f.rate);
      let quality = mean(|f| f.quality);
      let impact = mean(|f| f.impact);
      area_means.push(impact);
      let sessions_count = contributors.iter().map(|(r, _)| r.sessions_count).sum();
      AreaImpact {
        area_id,
        impact_score: round2(impact),
        completion_rate: round2(rate),
        consistency_bonus: round2(mean(|f| f.bonus)),
        quality_average: round2(quality),
        sessions_count,
        ritual_ids: contributors.iter().map(|(r, _)| r.ritual_id).collect(),
        reasoning: reasoning(rate, quality, sessions_count),
      }
    })
    .collect();

  let overall_ritual_score = if area_means.is_empty() {
    0.0
  } else {
    round2(area_means.iter().sum::<f64>() / area_means.len() as f64)
  };

  let ritual_impacts: Vec<RitualImpact> = scored.into_iter().map(|(r, _)| r).collect();

  RitualImpactReport {
    period,
    overall_ritual_score,
    total_sessions: ritual_impacts.iter().map(|r| r.sessions_count).sum(),
    total_rituals_tracked: ritual_impacts.len(),
    impacts,
    rituals: ritual_impacts,
  }
}
