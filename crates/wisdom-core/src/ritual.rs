//! Rituals (recurring practices) and their completion sessions.
//!
//! Rituals are soft-deactivated, never deleted while sessions reference them.
//! Sessions are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// How often a ritual is meant to happen.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Cadence {
  Daily,
  Weekly,
  Monthly,
  /// User-defined rhythm; scored as weekly.
  Custom,
}

impl Cadence {
  /// Expected number of days between two completions.
  pub fn expected_gap_days(self) -> f64 {
    match self {
      Self::Daily => 1.0,
      Self::Weekly | Self::Custom => 7.0,
      Self::Monthly => 30.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ritual {
  pub ritual_id:  Uuid,
  pub user_id:    Uuid,
  pub name:       String,
  pub cadence:    Cadence,
  /// Areas this ritual feeds into.
  pub area_ids:   Vec<Uuid>,
  pub active:     bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRitual {
  pub user_id:  Uuid,
  pub name:     String,
  pub cadence:  Cadence,
  #[serde(default)]
  pub area_ids: Vec<Uuid>,
}

/// One completion of a ritual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitualSession {
  pub session_id:       Uuid,
  pub ritual_id:        Uuid,
  pub user_id:          Uuid,
  pub completed_at:     DateTime<Utc>,
  pub duration_minutes: Option<u32>,
  /// 1–5 when rated.
  pub quality:          Option<u8>,
  pub notes:            Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRitualSession {
  pub ritual_id:        Uuid,
  #[serde(default)]
  pub completed_at:     Option<DateTime<Utc>>,
  #[serde(default)]
  pub duration_minutes: Option<u32>,
  #[serde(default)]
  pub quality:          Option<u8>,
  #[serde(default)]
  pub notes:            Option<String>,
}

impl NewRitualSession {
  pub fn new(ritual_id: Uuid, completed_at: DateTime<Utc>) -> Self {
    Self {
      ritual_id,
      completed_at: Some(completed_at),
      duration_minutes: None,
      quality: None,
      notes: None,
    }
  }

  pub fn validate(&self) -> Result<()> {
    match self.quality {
      Some(q) if !(1..=5).contains(&q) => Err(Error::InvalidQuality(q)),
      _ => Ok(()),
    }
  }

  /// Build the stored session for the ritual's owner.
  pub fn into_session(self, user_id: Uuid, now: DateTime<Utc>) -> RitualSession {
    RitualSession {
      session_id: Uuid::new_v4(),
      ritual_id: self.ritual_id,
      user_id,
      completed_at: self.completed_at.unwrap_or(now),
      duration_minutes: self.duration_minutes,
      quality: self.quality,
      notes: self.notes,
    }
  }
}
