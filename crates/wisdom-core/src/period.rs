//! Rollup periods and the UTC time ranges derived from them.
//!
//! A period is identified by a string key: `"YYYY-MM"` for a calendar month,
//! `"YYYY-Qn"` for a calendar quarter. Boundaries are always computed from the
//! key and never stored alongside it.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

// ─── Period type ─────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PeriodType {
  Monthly,
  Quarterly,
}

// ─── Period ──────────────────────────────────────────────────────────────────

/// A calendar month or quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
  Month { year: i32, month: u32 },
  Quarter { year: i32, quarter: u32 },
}

impl Period {
  /// Parse a period key and, if `expected` is given, check that the key has
  /// that shape.
  pub fn parse(key: &str, expected: Option<PeriodType>) -> Result<Self> {
    let period: Self = key.parse()?;
    match expected {
      Some(t) if t != period.period_type() => Err(Error::PeriodTypeMismatch {
        period:   key.to_owned(),
        expected: t.to_string(),
      }),
      _ => Ok(period),
    }
  }

  pub fn period_type(&self) -> PeriodType {
    match self {
      Self::Month { .. } => PeriodType::Monthly,
      Self::Quarter { .. } => PeriodType::Quarterly,
    }
  }

  /// First calendar day of the period.
  pub fn first_day(&self) -> NaiveDate {
    let (year, month) = match *self {
      Self::Month { year, month } => (year, month),
      Self::Quarter { year, quarter } => (year, (quarter - 1) * 3 + 1),
    };
    // Components are validated on construction.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
  }

  /// Last calendar day of the period.
  pub fn last_day(&self) -> NaiveDate {
    self.next_first_day().pred_opt().unwrap_or(NaiveDate::MIN)
  }

  /// Number of calendar days covered.
  pub fn days(&self) -> i64 {
    (self.next_first_day() - self.first_day()).num_days()
  }

  /// The half-open UTC range `[first day 00:00, day after last day 00:00)`.
  pub fn range(&self) -> TimeRange {
    TimeRange {
      start: midnight(self.first_day()),
      end:   midnight(self.next_first_day()),
    }
  }

  /// The last second that still falls inside the period.
  pub fn last_instant(&self) -> DateTime<Utc> {
    self.range().end - Duration::seconds(1)
  }

  fn next_first_day(&self) -> NaiveDate {
    let (year, month) = match *self {
      Self::Month { year, month } => (year, month),
      Self::Quarter { year, quarter } => (year, quarter * 3),
    };
    let (y, m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(NaiveDate::MAX)
  }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
  Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

impl FromStr for Period {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidPeriod(s.to_owned());

    let (year_str, rest) = s.split_once('-').ok_or_else(invalid)?;
    if year_str.len() != 4 || !year_str.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }
    let year: i32 = year_str.parse().map_err(|_| invalid())?;

    if let Some(q) = rest.strip_prefix('Q') {
      if q.len() != 1 {
        return Err(invalid());
      }
      let quarter: u32 = q.parse().map_err(|_| invalid())?;
      if !(1..=4).contains(&quarter) {
        return Err(invalid());
      }
      return Ok(Self::Quarter { year, quarter });
    }

    if rest.len() != 2 || !rest.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }
    let month: u32 = rest.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
      return Err(invalid());
    }
    Ok(Self::Month { year, month })
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Month { year, month } => write!(f, "{year:04}-{month:02}"),
      Self::Quarter { year, quarter } => write!(f, "{year:04}-Q{quarter}"),
    }
  }
}

impl Serialize for Period {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Period {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let key = String::deserialize(d)?;
    key.parse().map_err(serde::de::Error::custom)
  }
}

// ─── Time range ──────────────────────────────────────────────────────────────

/// A half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>,
}

impl TimeRange {
  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at < self.end
  }

  /// The `days`-long window that closes at `self.end`, cut off at
  /// `self.start`.
  pub fn trailing(&self, days: i64) -> Self {
    Self { start: self.start.max(self.end - Duration::days(days)), end: self.end }
  }
}
