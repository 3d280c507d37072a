//! Life areas, their dimensions and importance weights.
//!
//! Areas are reference data: created at tenant or user setup and rarely
//! mutated. The weight is the one field users customise regularly, and that
//! customisation lives in a separate per-user override.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A life domain tracked for fulfillment (e.g. "Health", "Work & Purpose").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
  pub area_id:        Uuid,
  /// Stable machine code, e.g. `"health"`.
  pub code:           String,
  pub name:           String,
  /// Importance weight used when the user has no override. `None` means the
  /// area carries no weight anywhere and is left out of the GFS.
  pub default_weight: Option<f64>,
  /// `None` for global canonical areas, otherwise the owning user.
  pub owner_id:       Option<Uuid>,
  pub active:         bool,
  pub created_at:     DateTime<Utc>,
}

/// Input for creating an area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArea {
  pub code:           String,
  pub name:           String,
  pub default_weight: Option<f64>,
  #[serde(default)]
  pub owner_id:       Option<Uuid>,
}

impl NewArea {
  pub fn validate(&self) -> Result<()> {
    if let Some(w) = self.default_weight {
      validate_weight(w)?;
    }
    Ok(())
  }
}

/// A named sub-facet of an area carrying its own weight in the manual-score
/// path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
  pub dimension_id:   Uuid,
  pub area_id:        Uuid,
  pub code:           String,
  pub name:           String,
  pub weight_default: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDimension {
  pub area_id:        Uuid,
  pub code:           String,
  pub name:           String,
  pub weight_default: f64,
}

impl NewDimension {
  pub fn validate(&self) -> Result<()> { validate_weight(self.weight_default) }
}

/// An area paired with the weight that applies to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedArea {
  pub area:   Area,
  pub weight: Option<f64>,
}

/// Resolve the weight for an area: the user override if present, otherwise
/// the area default. Unusable values (negative, NaN) resolve to nothing.
pub fn resolve_weight(area: &Area, custom: Option<f64>) -> Option<f64> {
  custom
    .or(area.default_weight)
    .filter(|w| w.is_finite() && *w >= 0.0)
}

/// Weights must be finite and non-negative.
pub fn validate_weight(w: f64) -> Result<()> {
  if w.is_finite() && w >= 0.0 {
    Ok(())
  } else {
    Err(Error::InvalidWeight(w))
  }
}
