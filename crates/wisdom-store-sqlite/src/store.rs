//! [`SqliteStore`], the SQLite implementation of [`FulfillmentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use wisdom_core::{
  area::{Area, Dimension, NewArea, NewDimension, validate_weight},
  period::{Period, TimeRange},
  ritual::{NewRitual, NewRitualSession, Ritual, RitualSession},
  rollup::{AreaRollup, PeriodSummary},
  signal::{EntryLink, NewEntryLink, NewRawScore, RawScore, ScoreSource, ritual_score_id},
  store::FulfillmentStore,
};

use crate::{
  Error, Result,
  encode::{
    AREA_COLUMNS, RAW_SCORE_COLUMNS, RITUAL_COLUMNS, RawArea, RawAreaRollup, RawDimension,
    RawEntryLink, RawRitual, RawScoreRow, RawSession, RawSummary, encode_dt, encode_period,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A WisdomOS fulfillment store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn area_exists(&self, area_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(area_id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM areas WHERE area_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn require_area(&self, area_id: Uuid) -> Result<()> {
    if self.area_exists(area_id).await? {
      Ok(())
    } else {
      Err(wisdom_core::Error::AreaNotFound(area_id).into())
    }
  }

  /// Fails unless `dimension_id` (when given) is one of `area_id`'s
  /// dimensions.
  async fn require_dimension(&self, area_id: Uuid, dimension_id: Option<Uuid>) -> Result<()> {
    let Some(dimension_id) = dimension_id else {
      return Ok(());
    };
    let dim_str  = encode_uuid(dimension_id);
    let area_str = encode_uuid(area_id);
    let owned = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM dimensions WHERE dimension_id = ?1 AND area_id = ?2",
              rusqlite::params![dim_str, area_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    if owned {
      Ok(())
    } else {
      Err(wisdom_core::Error::DimensionNotFound(dimension_id).into())
    }
  }

  async fn load_ritual_areas(&self, raws: &mut [RawRitual]) -> Result<()> {
    let ids: Vec<String> = raws.iter().map(|r| r.ritual_id.clone()).collect();
    let area_lists: Vec<Vec<String>> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT area_id FROM ritual_areas WHERE ritual_id = ?1 ORDER BY area_id",
        )?;
        let mut lists = Vec::with_capacity(ids.len());
        for id in &ids {
          let areas = stmt
            .query_map(rusqlite::params![id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          lists.push(areas);
        }
        Ok(lists)
      })
      .await?;

    for (raw, areas) in raws.iter_mut().zip(area_lists) {
      raw.area_ids = areas;
    }
    Ok(())
  }
}

fn insert_score_row(conn: &rusqlite::Connection, row: &RawScoreRow) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT OR REPLACE INTO raw_scores ({RAW_SCORE_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    ),
    rusqlite::params![
      row.score_id,
      row.user_id,
      row.area_id,
      row.dimension_id,
      row.score,
      row.recorded_at,
      row.source,
      row.confidence,
      row.metadata,
    ],
  )?;
  Ok(())
}

// ─── FulfillmentStore impl ───────────────────────────────────────────────────

impl FulfillmentStore for SqliteStore {
  type Error = Error;

  // ── Areas & weights ───────────────────────────────────────────────────────

  async fn add_area(&self, input: NewArea) -> Result<Area> {
    input.validate()?;
    let area = Area {
      area_id:        Uuid::new_v4(),
      code:           input.code,
      name:           input.name,
      default_weight: input.default_weight,
      owner_id:       input.owner_id,
      active:         true,
      created_at:     Utc::now(),
    };

    let id_str    = encode_uuid(area.area_id);
    let code      = area.code.clone();
    let name      = area.name.clone();
    let weight    = area.default_weight;
    let owner_str = area.owner_id.map(encode_uuid);
    let at_str    = encode_dt(area.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO areas ({AREA_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)"),
          rusqlite::params![id_str, code, name, weight, owner_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(area)
  }

  async fn get_area(&self, area_id: Uuid) -> Result<Option<Area>> {
    let id_str = encode_uuid(area_id);

    let raw: Option<RawArea> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {AREA_COLUMNS} FROM areas WHERE area_id = ?1"),
              rusqlite::params![id_str],
              RawArea::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawArea::into_area).transpose()
  }

  async fn list_areas(&self, user_id: Uuid) -> Result<Vec<Area>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawArea> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AREA_COLUMNS} FROM areas
           WHERE active = 1 AND (owner_id IS NULL OR owner_id = ?1)
           ORDER BY code, area_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawArea::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArea::into_area).collect()
  }

  async fn set_custom_weight(&self, user_id: Uuid, area_id: Uuid, weight: f64) -> Result<()> {
    validate_weight(weight)?;
    self.require_area(area_id).await?;

    let user_str = encode_uuid(user_id);
    let area_str = encode_uuid(area_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO custom_weights (user_id, area_id, weight) VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id, area_id) DO UPDATE SET weight = excluded.weight",
          rusqlite::params![user_str, area_str, weight],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_custom_weight(&self, user_id: Uuid, area_id: Uuid) -> Result<Option<f64>> {
    let user_str = encode_uuid(user_id);
    let area_str = encode_uuid(area_id);

    let weight = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT weight FROM custom_weights WHERE user_id = ?1 AND area_id = ?2",
              rusqlite::params![user_str, area_str],
              |r| r.get::<_, f64>(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(weight)
  }

  async fn delete_custom_weight(&self, user_id: Uuid, area_id: Uuid) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let area_str = encode_uuid(area_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM custom_weights WHERE user_id = ?1 AND area_id = ?2",
          rusqlite::params![user_str, area_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn add_dimension(&self, input: NewDimension) -> Result<Dimension> {
    input.validate()?;
    self.require_area(input.area_id).await?;

    let dimension = Dimension {
      dimension_id:   Uuid::new_v4(),
      area_id:        input.area_id,
      code:           input.code,
      name:           input.name,
      weight_default: input.weight_default,
    };

    let id_str   = encode_uuid(dimension.dimension_id);
    let area_str = encode_uuid(dimension.area_id);
    let code     = dimension.code.clone();
    let name     = dimension.name.clone();
    let weight   = dimension.weight_default;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO dimensions (dimension_id, area_id, code, name, weight_default)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, area_str, code, name, weight],
        )?;
        Ok(())
      })
      .await?;

    Ok(dimension)
  }

  async fn list_dimensions(&self, area_id: Uuid) -> Result<Vec<Dimension>> {
    let area_str = encode_uuid(area_id);

    let raws: Vec<RawDimension> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT dimension_id, area_id, code, name, weight_default
           FROM dimensions WHERE area_id = ?1 ORDER BY code, dimension_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![area_str], RawDimension::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDimension::into_dimension).collect()
  }

  // ── Raw signals ───────────────────────────────────────────────────────────

  async fn record_raw_score(&self, input: NewRawScore) -> Result<RawScore> {
    input.validate()?;
    self.require_area(input.area_id).await?;
    self.require_dimension(input.area_id, input.dimension_id).await?;

    let score = input.into_raw_score(Utc::now());
    let row = RawScoreRow::from_raw_score(&score)?;
    self
      .conn
      .call(move |conn| {
        insert_score_row(conn, &row)?;
        Ok(())
      })
      .await?;
    Ok(score)
  }

  async fn replace_ritual_scores(
    &self,
    user_id: Uuid,
    period: Period,
    scores: Vec<RawScore>,
  ) -> Result<()> {
    if let Some(bad) = scores.iter().find(|s| !(0.0..=5.0).contains(&s.score)) {
      return Err(wisdom_core::Error::InvalidScore(bad.score).into());
    }
    let rows = scores
      .iter()
      .map(RawScoreRow::from_raw_score)
      .collect::<Result<Vec<_>>>()?;
    let user_str   = encode_uuid(user_id);
    let source_str = ScoreSource::RitualTracking.as_ref().to_owned();
    let stamp_str  = encode_dt(period.last_instant());

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let stale: Vec<String> = {
          let mut stmt = tx.prepare(
            "SELECT score_id, area_id FROM raw_scores
             WHERE user_id = ?1 AND source = ?2 AND recorded_at = ?3",
          )?;
          stmt
            .query_map(rusqlite::params![user_str, source_str, stamp_str], |r| {
              Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter(|(score_id, area_id)| {
              Uuid::parse_str(area_id)
                .is_ok_and(|a| encode_uuid(ritual_score_id(user_id, a, period)) == *score_id)
            })
            .map(|(score_id, _)| score_id)
            .collect()
        };
        for score_id in &stale {
          tx.execute("DELETE FROM raw_scores WHERE score_id = ?1", rusqlite::params![score_id])?;
        }
        for row in &rows {
          insert_score_row(&tx, row)?;
        }

        tx.commit()?;
        Ok(stale.len())
      })
      .await?;

    tracing::debug!(%user_id, %period, removed, written = scores.len(), "replaced ritual scores");
    Ok(())
  }

  async fn query_raw_scores(
    &self,
    user_id: Uuid,
    area_id: Uuid,
    range: TimeRange,
  ) -> Result<Vec<RawScore>> {
    let user_str  = encode_uuid(user_id);
    let area_str  = encode_uuid(area_id);
    let start_str = encode_dt(range.start);
    let end_str   = encode_dt(range.end);

    let raws: Vec<RawScoreRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RAW_SCORE_COLUMNS} FROM raw_scores
           WHERE user_id = ?1 AND area_id = ?2
             AND recorded_at >= ?3 AND recorded_at < ?4
           ORDER BY recorded_at, score_id"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_str, area_str, start_str, end_str],
            RawScoreRow::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawScoreRow::into_raw_score).collect()
  }

  async fn record_entry_link(&self, input: NewEntryLink) -> Result<EntryLink> {
    input.validate()?;
    self.require_area(input.area_id).await?;
    let link = input.into_entry_link(Utc::now());

    let link_id_str  = encode_uuid(link.link_id);
    let user_str     = encode_uuid(link.user_id);
    let entry_str    = encode_uuid(link.entry_id);
    let area_str     = encode_uuid(link.area_id);
    let kind         = link.entry_kind.clone();
    let strength     = link.strength;
    let recorded_str = encode_dt(link.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO entry_links
             (link_id, user_id, entry_id, area_id, entry_kind, strength, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            link_id_str,
            user_str,
            entry_str,
            area_str,
            kind,
            strength,
            recorded_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(link)
  }

  async fn query_entry_links(
    &self,
    user_id: Uuid,
    area_id: Uuid,
    range: TimeRange,
  ) -> Result<Vec<EntryLink>> {
    let user_str  = encode_uuid(user_id);
    let area_str  = encode_uuid(area_id);
    let start_str = encode_dt(range.start);
    let end_str   = encode_dt(range.end);

    let raws: Vec<RawEntryLink> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT link_id, user_id, entry_id, area_id, entry_kind, strength, recorded_at
           FROM entry_links
           WHERE user_id = ?1 AND area_id = ?2
             AND recorded_at >= ?3 AND recorded_at < ?4
           ORDER BY recorded_at, link_id",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_str, area_str, start_str, end_str],
            RawEntryLink::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntryLink::into_entry_link).collect()
  }

  // ── Rituals ───────────────────────────────────────────────────────────────

  async fn add_ritual(&self, input: NewRitual) -> Result<Ritual> {
    let mut area_ids = input.area_ids;
    area_ids.sort();
    area_ids.dedup();

    let ritual = Ritual {
      ritual_id:  Uuid::new_v4(),
      user_id:    input.user_id,
      name:       input.name,
      cadence:    input.cadence,
      area_ids,
      active:     true,
      created_at: Utc::now(),
    };

    let id_str      = encode_uuid(ritual.ritual_id);
    let user_str    = encode_uuid(ritual.user_id);
    let name        = ritual.name.clone();
    let cadence_str = ritual.cadence.as_ref().to_owned();
    let at_str      = encode_dt(ritual.created_at);
    let areas: Vec<String> = ritual.area_ids.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!("INSERT INTO rituals ({RITUAL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, 1, ?5)"),
          rusqlite::params![id_str, user_str, name, cadence_str, at_str],
        )?;
        for area in &areas {
          tx.execute(
            "INSERT INTO ritual_areas (ritual_id, area_id) VALUES (?1, ?2)",
            rusqlite::params![id_str, area],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(ritual)
  }

  async fn get_ritual(&self, ritual_id: Uuid) -> Result<Option<Ritual>> {
    let id_str = encode_uuid(ritual_id);

    let raw: Option<RawRitual> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RITUAL_COLUMNS} FROM rituals WHERE ritual_id = ?1"),
              rusqlite::params![id_str],
              RawRitual::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    let Some(raw) = raw else {
      return Ok(None);
    };
    let mut raws = [raw];
    self.load_ritual_areas(&mut raws).await?;
    let [raw] = raws;
    raw.into_ritual().map(Some)
  }

  async fn deactivate_ritual(&self, ritual_id: Uuid) -> Result<Option<Ritual>> {
    let id_str = encode_uuid(ritual_id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE rituals SET active = 0 WHERE ritual_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Ok(None);
    }
    self.get_ritual(ritual_id).await
  }

  async fn list_active_rituals(&self, user_id: Uuid) -> Result<Vec<Ritual>> {
    let user_str = encode_uuid(user_id);

    let mut raws: Vec<RawRitual> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RITUAL_COLUMNS} FROM rituals
           WHERE user_id = ?1 AND active = 1
           ORDER BY name, ritual_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawRitual::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    self.load_ritual_areas(&mut raws).await?;
    raws.into_iter().map(RawRitual::into_ritual).collect()
  }

  async fn record_ritual_session(&self, input: NewRitualSession) -> Result<RitualSession> {
    input.validate()?;
    let ritual = self
      .get_ritual(input.ritual_id)
      .await?
      .ok_or(wisdom_core::Error::RitualNotFound(input.ritual_id))?;
    let session = input.into_session(ritual.user_id, Utc::now());

    let id_str     = encode_uuid(session.session_id);
    let ritual_str = encode_uuid(session.ritual_id);
    let user_str   = encode_uuid(session.user_id);
    let at_str     = encode_dt(session.completed_at);
    let duration   = session.duration_minutes;
    let quality    = session.quality;
    let notes      = session.notes.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ritual_sessions
             (session_id, ritual_id, user_id, completed_at, duration_minutes, quality, notes)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, ritual_str, user_str, at_str, duration, quality, notes],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn query_ritual_sessions(
    &self,
    user_id: Uuid,
    range: TimeRange,
  ) -> Result<Vec<RitualSession>> {
    let user_str  = encode_uuid(user_id);
    let start_str = encode_dt(range.start);
    let end_str   = encode_dt(range.end);

    let raws: Vec<RawSession> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT session_id, ritual_id, user_id, completed_at, duration_minutes, quality, notes
           FROM ritual_sessions
           WHERE user_id = ?1 AND completed_at >= ?2 AND completed_at < ?3
           ORDER BY completed_at, session_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, start_str, end_str], RawSession::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSession::into_session).collect()
  }

  // ── Rollups ───────────────────────────────────────────────────────────────

  async fn save_rollup(&self, summary: PeriodSummary, areas: Vec<AreaRollup>) -> Result<()> {
    let user_str    = encode_uuid(summary.user_id);
    let period_str  = encode_period(summary.period);
    let gfs         = summary.gfs;
    let confidence  = summary.confidence;
    let computed_at = encode_dt(summary.computed_at);

    let rows: Vec<(String, String, String, f64, f64, String, Option<f64>)> = areas
      .iter()
      .map(|r| {
        (
          encode_uuid(r.user_id),
          encode_uuid(r.area_id),
          encode_period(r.period),
          r.score,
          r.trend_30d,
          r.strategy.as_ref().to_owned(),
          r.weight,
        )
      })
      .collect();
    let area_count = rows.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        {
          let keep: Vec<&str> = rows.iter().map(|r| r.1.as_str()).collect();
          let mut existing = tx.prepare(
            "SELECT area_id FROM area_rollups WHERE user_id = ?1 AND period = ?2",
          )?;
          let stale: Vec<String> = existing
            .query_map(rusqlite::params![user_str, period_str], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter(|id| !keep.contains(&id.as_str()))
            .collect();
          for area_id in stale {
            tx.execute(
              "DELETE FROM area_rollups WHERE user_id = ?1 AND period = ?2 AND area_id = ?3",
              rusqlite::params![user_str, period_str, area_id],
            )?;
          }
        }

        for (user, area, period, score, trend, strategy, weight) in &rows {
          tx.execute(
            "INSERT INTO area_rollups
               (user_id, area_id, period, score, trend_30d, strategy, weight)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (user_id, area_id, period) DO UPDATE SET
               score     = excluded.score,
               trend_30d = excluded.trend_30d,
               strategy  = excluded.strategy,
               weight    = excluded.weight",
            rusqlite::params![user, area, period, score, trend, strategy, weight],
          )?;
        }

        tx.execute(
          "INSERT INTO period_summaries (user_id, period, gfs, confidence, computed_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (user_id, period) DO UPDATE SET
             gfs         = excluded.gfs,
             confidence  = excluded.confidence,
             computed_at = excluded.computed_at",
          rusqlite::params![user_str, period_str, gfs, confidence, computed_at],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(areas = area_count, "saved rollup");
    Ok(())
  }

  async fn get_summary(&self, user_id: Uuid, period: Period) -> Result<Option<PeriodSummary>> {
    let user_str   = encode_uuid(user_id);
    let period_str = encode_period(period);

    let raw: Option<RawSummary> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, period, gfs, confidence, computed_at
               FROM period_summaries WHERE user_id = ?1 AND period = ?2",
              rusqlite::params![user_str, period_str],
              RawSummary::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSummary::into_summary).transpose()
  }

  async fn list_area_rollups(&self, user_id: Uuid, period: Period) -> Result<Vec<AreaRollup>> {
    let user_str   = encode_uuid(user_id);
    let period_str = encode_period(period);

    let raws: Vec<RawAreaRollup> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, area_id, period, score, trend_30d, strategy, weight
           FROM area_rollups WHERE user_id = ?1 AND period = ?2
           ORDER BY area_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, period_str], RawAreaRollup::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAreaRollup::into_area_rollup).collect()
  }

  async fn delete_rollup(&self, user_id: Uuid, period: Period) -> Result<bool> {
    let user_str   = encode_uuid(user_id);
    let period_str = encode_period(period);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM area_rollups WHERE user_id = ?1 AND period = ?2",
          rusqlite::params![user_str, period_str],
        )?;
        let removed = tx.execute(
          "DELETE FROM period_summaries WHERE user_id = ?1 AND period = ?2",
          rusqlite::params![user_str, period_str],
        )?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    Ok(removed > 0)
  }
}
