//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings. Enums are stored
//! as their snake_case names, periods as their key, metadata as compact JSON.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use wisdom_core::{
  area::{Area, Dimension},
  period::Period,
  ritual::{Cadence, Ritual, RitualSession},
  rollup::{AreaRollup, PeriodSummary, ScoringStrategy},
  signal::{EntryLink, RawScore, ScoreSource},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums & periods ──────────────────────────────────────────────────────────

fn decode_enum<T: std::str::FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

pub fn encode_period(p: Period) -> String { p.to_string() }

pub fn decode_period(s: &str) -> Result<Period> { decode_enum("period", s) }

pub fn encode_metadata(m: Option<&serde_json::Value>) -> Result<Option<String>> {
  Ok(m.map(serde_json::to_string).transpose()?)
}

// ─── Raw row types ────────────────────────────────────────────────────────────
//
// Each struct mirrors one SELECT column list and converts into the domain type
// outside the database thread.

pub struct RawArea {
  pub area_id:        String,
  pub code:           String,
  pub name:           String,
  pub default_weight: Option<f64>,
  pub owner_id:       Option<String>,
  pub active:         bool,
  pub created_at:     String,
}

pub const AREA_COLUMNS: &str =
  "area_id, code, name, default_weight, owner_id, active, created_at";

impl RawArea {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      area_id:        row.get(0)?,
      code:           row.get(1)?,
      name:           row.get(2)?,
      default_weight: row.get(3)?,
      owner_id:       row.get(4)?,
      active:         row.get(5)?,
      created_at:     row.get(6)?,
    })
  }

  pub fn into_area(self) -> Result<Area> {
    Ok(Area {
      area_id:        decode_uuid(&self.area_id)?,
      code:           self.code,
      name:           self.name,
      default_weight: self.default_weight,
      owner_id:       decode_opt_uuid(self.owner_id)?,
      active:         self.active,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawDimension {
  pub dimension_id:   String,
  pub area_id:        String,
  pub code:           String,
  pub name:           String,
  pub weight_default: f64,
}

impl RawDimension {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      dimension_id:   row.get(0)?,
      area_id:        row.get(1)?,
      code:           row.get(2)?,
      name:           row.get(3)?,
      weight_default: row.get(4)?,
    })
  }

  pub fn into_dimension(self) -> Result<Dimension> {
    Ok(Dimension {
      dimension_id:   decode_uuid(&self.dimension_id)?,
      area_id:        decode_uuid(&self.area_id)?,
      code:           self.code,
      name:           self.name,
      weight_default: self.weight_default,
    })
  }
}

pub struct RawScoreRow {
  pub score_id:     String,
  pub user_id:      String,
  pub area_id:      String,
  pub dimension_id: Option<String>,
  pub score:        f64,
  pub recorded_at:  String,
  pub source:       String,
  pub confidence:   Option<f64>,
  pub metadata:     Option<String>,
}

pub const RAW_SCORE_COLUMNS: &str =
  "score_id, user_id, area_id, dimension_id, score, recorded_at, source, confidence, metadata";

impl RawScoreRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      score_id:     row.get(0)?,
      user_id:      row.get(1)?,
      area_id:      row.get(2)?,
      dimension_id: row.get(3)?,
      score:        row.get(4)?,
      recorded_at:  row.get(5)?,
      source:       row.get(6)?,
      confidence:   row.get(7)?,
      metadata:     row.get(8)?,
    })
  }

  pub fn from_raw_score(score: &RawScore) -> Result<Self> {
    Ok(Self {
      score_id:     encode_uuid(score.score_id),
      user_id:      encode_uuid(score.user_id),
      area_id:      encode_uuid(score.area_id),
      dimension_id: score.dimension_id.map(encode_uuid),
      score:        score.score,
      recorded_at:  encode_dt(score.recorded_at),
      source:       score.source.as_ref().to_owned(),
      confidence:   score.confidence,
      metadata:     encode_metadata(score.metadata.as_ref())?,
    })
  }

  pub fn into_raw_score(self) -> Result<RawScore> {
    Ok(RawScore {
      score_id:     decode_uuid(&self.score_id)?,
      user_id:      decode_uuid(&self.user_id)?,
      area_id:      decode_uuid(&self.area_id)?,
      dimension_id: decode_opt_uuid(self.dimension_id)?,
      score:        self.score,
      recorded_at:  decode_dt(&self.recorded_at)?,
      source:       decode_enum::<ScoreSource>("source", &self.source)?,
      confidence:   self.confidence,
      metadata:     self.metadata.as_deref().map(serde_json::from_str).transpose()?,
    })
  }
}

pub struct RawEntryLink {
  pub link_id:     String,
  pub user_id:     String,
  pub entry_id:    String,
  pub area_id:     String,
  pub entry_kind:  String,
  pub strength:    f64,
  pub recorded_at: String,
}

impl RawEntryLink {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      link_id:     row.get(0)?,
      user_id:     row.get(1)?,
      entry_id:    row.get(2)?,
      area_id:     row.get(3)?,
      entry_kind:  row.get(4)?,
      strength:    row.get(5)?,
      recorded_at: row.get(6)?,
    })
  }

  pub fn into_entry_link(self) -> Result<EntryLink> {
    Ok(EntryLink {
      link_id:     decode_uuid(&self.link_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      entry_id:    decode_uuid(&self.entry_id)?,
      area_id:     decode_uuid(&self.area_id)?,
      entry_kind:  self.entry_kind,
      strength:    self.strength,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// A ritual row plus its area ids, gathered from `ritual_areas`.
pub struct RawRitual {
  pub ritual_id:  String,
  pub user_id:    String,
  pub name:       String,
  pub cadence:    String,
  pub active:     bool,
  pub created_at: String,
  pub area_ids:   Vec<String>,
}

pub const RITUAL_COLUMNS: &str = "ritual_id, user_id, name, cadence, active, created_at";

impl RawRitual {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ritual_id:  row.get(0)?,
      user_id:    row.get(1)?,
      name:       row.get(2)?,
      cadence:    row.get(3)?,
      active:     row.get(4)?,
      created_at: row.get(5)?,
      area_ids:   Vec::new(),
    })
  }

  pub fn into_ritual(self) -> Result<Ritual> {
    Ok(Ritual {
      ritual_id:  decode_uuid(&self.ritual_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      name:       self.name,
      cadence:    decode_enum::<Cadence>("cadence", &self.cadence)?,
      area_ids:   self.area_ids.iter().map(|s| decode_uuid(s)).collect::<Result<_>>()?,
      active:     self.active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawSession {
  pub session_id:       String,
  pub ritual_id:        String,
  pub user_id:          String,
  pub completed_at:     String,
  pub duration_minutes: Option<u32>,
  pub quality:          Option<u8>,
  pub notes:            Option<String>,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:       row.get(0)?,
      ritual_id:        row.get(1)?,
      user_id:          row.get(2)?,
      completed_at:     row.get(3)?,
      duration_minutes: row.get(4)?,
      quality:          row.get(5)?,
      notes:            row.get(6)?,
    })
  }

  pub fn into_session(self) -> Result<RitualSession> {
    Ok(RitualSession {
      session_id:       decode_uuid(&self.session_id)?,
      ritual_id:        decode_uuid(&self.ritual_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      completed_at:     decode_dt(&self.completed_at)?,
      duration_minutes: self.duration_minutes,
      quality:          self.quality,
      notes:            self.notes,
    })
  }
}

pub struct RawAreaRollup {
  pub user_id:   String,
  pub area_id:   String,
  pub period:    String,
  pub score:     f64,
  pub trend_30d: f64,
  pub strategy:  String,
  pub weight:    Option<f64>,
}

impl RawAreaRollup {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:   row.get(0)?,
      area_id:   row.get(1)?,
      period:    row.get(2)?,
      score:     row.get(3)?,
      trend_30d: row.get(4)?,
      strategy:  row.get(5)?,
      weight:    row.get(6)?,
    })
  }

  pub fn into_area_rollup(self) -> Result<AreaRollup> {
    Ok(AreaRollup {
      user_id:   decode_uuid(&self.user_id)?,
      area_id:   decode_uuid(&self.area_id)?,
      period:    decode_period(&self.period)?,
      score:     self.score,
      trend_30d: self.trend_30d,
      strategy:  decode_enum::<ScoringStrategy>("strategy", &self.strategy)?,
      weight:    self.weight,
    })
  }
}

pub struct RawSummary {
  pub user_id:     String,
  pub period:      String,
  pub gfs:         f64,
  pub confidence:  f64,
  pub computed_at: String,
}

impl RawSummary {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:     row.get(0)?,
      period:      row.get(1)?,
      gfs:         row.get(2)?,
      confidence:  row.get(3)?,
      computed_at: row.get(4)?,
    })
  }

  pub fn into_summary(self) -> Result<PeriodSummary> {
    Ok(PeriodSummary {
      user_id:     decode_uuid(&self.user_id)?,
      period:      decode_period(&self.period)?,
      gfs:         self.gfs,
      confidence:  self.confidence,
      computed_at: decode_dt(&self.computed_at)?,
    })
  }
}
