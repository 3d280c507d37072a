//! Pure scoring functions.
//!
//! Nothing in this module touches a store. The engine loads signals, hands
//! them to these functions and persists what comes back.

pub mod aggregate;
pub mod gfs;
pub mod ritual_impact;
pub mod trend;

pub use aggregate::{score_area, score_entry_links, score_raw_scores};
pub use gfs::{NoDataPolicy, compute_gfs};
pub use ritual_impact::{AreaImpact, RitualImpactReport, compute_ritual_impact};
pub use trend::{coverage_confidence, trend_30d};

/// Round to two decimals, the precision every persisted figure carries.
pub fn round2(x: f64) -> f64 { (x * 100.0).round() / 100.0 }

#[cfg(test)]
mod tests {
  use super::round2;

  #[test]
  fn rounds_half_away_from_zero() {
    assert_eq!(round2(3.14159), 3.14);
    assert_eq!(round2(2.675000001), 2.68);
    assert_eq!(round2(0.0), 0.0);
  }
}
