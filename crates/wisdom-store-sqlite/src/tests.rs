//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;
use wisdom_core::{
  area::{NewArea, NewDimension},
  engine::FulfillmentEngine,
  period::Period,
  ritual::{Cadence, NewRitual, NewRitualSession},
  rollup::{AreaRollup, PeriodSummary, ScoringStrategy},
  signal::{NewEntryLink, NewRawScore, RawScore, ScoreSource, ritual_score_id},
  store::FulfillmentStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn march(day: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 3, day, 9, 30, 0).unwrap() }

fn march_period() -> Period { Period::Month { year: 2025, month: 3 } }

fn new_area(code: &str, weight: Option<f64>) -> NewArea {
  NewArea {
    code:           code.into(),
    name:           code.to_uppercase(),
    default_weight: weight,
    owner_id:       None,
  }
}

// ─── Areas & weights ─────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_area() {
  let s = store().await;

  let area = s.add_area(new_area("health", Some(20.0))).await.unwrap();
  let fetched = s.get_area(area.area_id).await.unwrap().unwrap();
  assert_eq!(fetched.code, "health");
  assert_eq!(fetched.default_weight, Some(20.0));
  assert!(fetched.owner_id.is_none());
  assert!(fetched.active);
  assert_eq!(fetched.created_at, area.created_at);
}

#[tokio::test]
async fn get_area_missing_returns_none() {
  let s = store().await;
  assert!(s.get_area(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_areas_shows_globals_and_own_areas_only() {
  let s = store().await;
  let me = Uuid::new_v4();
  let other = Uuid::new_v4();

  s.add_area(new_area("work", Some(10.0))).await.unwrap();
  s.add_area(new_area("health", Some(10.0))).await.unwrap();
  s.add_area(NewArea { owner_id: Some(me), ..new_area("music", None) }).await.unwrap();
  s.add_area(NewArea { owner_id: Some(other), ..new_area("chess", None) }).await.unwrap();

  let codes: Vec<String> = s.list_areas(me).await.unwrap().into_iter().map(|a| a.code).collect();
  assert_eq!(codes, vec!["health", "music", "work"]);
}

#[tokio::test]
async fn custom_weight_roundtrip_and_delete() {
  let s = store().await;
  let user = Uuid::new_v4();
  let area = s.add_area(new_area("health", Some(20.0))).await.unwrap();

  assert_eq!(s.get_custom_weight(user, area.area_id).await.unwrap(), None);

  s.set_custom_weight(user, area.area_id, 35.0).await.unwrap();
  s.set_custom_weight(user, area.area_id, 40.0).await.unwrap();
  assert_eq!(s.get_custom_weight(user, area.area_id).await.unwrap(), Some(40.0));

  assert!(s.delete_custom_weight(user, area.area_id).await.unwrap());
  assert!(!s.delete_custom_weight(user, area.area_id).await.unwrap());
  assert_eq!(s.get_custom_weight(user, area.area_id).await.unwrap(), None);
}

#[tokio::test]
async fn custom_weight_for_unknown_area_is_rejected() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s.set_custom_weight(Uuid::new_v4(), missing, 10.0).await.unwrap_err();
  assert!(matches!(err, Error::Core(wisdom_core::Error::AreaNotFound(id)) if id == missing));
}

#[tokio::test]
async fn negative_custom_weight_is_rejected() {
  let s = store().await;
  let area = s.add_area(new_area("health", None)).await.unwrap();
  let err = s.set_custom_weight(Uuid::new_v4(), area.area_id, -1.0).await.unwrap_err();
  assert!(matches!(err, Error::Core(wisdom_core::Error::InvalidWeight(_))));
}

#[tokio::test]
async fn dimensions_belong_to_their_area() {
  let s = store().await;
  let health = s.add_area(new_area("health", None)).await.unwrap();
  let work = s.add_area(new_area("work", None)).await.unwrap();

  for (code, w) in [("sleep", 2.0), ("fitness", 1.0)] {
    s.add_dimension(NewDimension {
      area_id:        health.area_id,
      code:           code.into(),
      name:           code.into(),
      weight_default: w,
    })
    .await
    .unwrap();
  }

  let dims = s.list_dimensions(health.area_id).await.unwrap();
  assert_eq!(dims.len(), 2);
  assert_eq!(dims[0].code, "fitness");
  assert!(s.list_dimensions(work.area_id).await.unwrap().is_empty());
}

// ─── Raw signals ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn raw_score_query_is_half_open_and_ordered() {
  let s = store().await;
  let user = Uuid::new_v4();
  let area = s.add_area(new_area("health", None)).await.unwrap();

  let at = |t: DateTime<Utc>, v: f64| {
    let mut input = NewRawScore::new(user, area.area_id, v);
    input.recorded_at = Some(t);
    input
  };
  s.record_raw_score(at(march(20), 4.0)).await.unwrap();
  s.record_raw_score(at(march(2), 2.0)).await.unwrap();
  s.record_raw_score(at(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(), 1.0))
    .await
    .unwrap();
  s.record_raw_score(at(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(), 5.0))
    .await
    .unwrap();

  let rows = s
    .query_raw_scores(user, area.area_id, march_period().range())
    .await
    .unwrap();
  let values: Vec<f64> = rows.iter().map(|r| r.score).collect();
  assert_eq!(values, vec![1.0, 2.0, 4.0]);
  assert!(rows.iter().all(|r| r.source == ScoreSource::Manual));
}

#[tokio::test]
async fn out_of_range_score_is_rejected() {
  let s = store().await;
  let area = s.add_area(new_area("health", None)).await.unwrap();
  let err = s
    .record_raw_score(NewRawScore::new(Uuid::new_v4(), area.area_id, 5.5))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(wisdom_core::Error::InvalidScore(_))));
}

fn ritual_row(user: Uuid, area_id: Uuid, period: Period, score: f64) -> RawScore {
  RawScore {
    score_id: ritual_score_id(user, area_id, period),
    user_id: user,
    area_id,
    dimension_id: None,
    score,
    recorded_at: period.last_instant(),
    source: ScoreSource::RitualTracking,
    confidence: Some(0.85),
    metadata: Some(serde_json::json!({ "sessions_count": 4 })),
  }
}

#[tokio::test]
async fn ritual_scores_are_replaced_as_a_set() {
  let s = store().await;
  let user = Uuid::new_v4();
  let health = s.add_area(new_area("health", None)).await.unwrap();
  let work = s.add_area(new_area("work", None)).await.unwrap();
  let period = march_period();

  s.replace_ritual_scores(
    user,
    period,
    vec![
      ritual_row(user, health.area_id, period, 3.0),
      ritual_row(user, work.area_id, period, 2.0),
    ],
  )
  .await
  .unwrap();
  let mut manual = NewRawScore::new(user, health.area_id, 1.0);
  manual.recorded_at = Some(period.last_instant());
  let manual = s.record_raw_score(manual).await.unwrap();

  // Health lost its ritual; work's estimate changed.
  let updated = ritual_row(user, work.area_id, period, 4.5);
  s.replace_ritual_scores(user, period, vec![updated.clone()]).await.unwrap();

  let health_rows = s.query_raw_scores(user, health.area_id, period.range()).await.unwrap();
  assert_eq!(health_rows, vec![manual]);
  let work_rows = s.query_raw_scores(user, work.area_id, period.range()).await.unwrap();
  assert_eq!(work_rows, vec![updated]);
}

#[tokio::test]
async fn ritual_replacement_leaves_other_periods_alone() {
  let s = store().await;
  let user = Uuid::new_v4();
  let health = s.add_area(new_area("health", None)).await.unwrap();
  let q1 = Period::Quarter { year: 2025, quarter: 1 };

  let quarterly = ritual_row(user, health.area_id, q1, 3.0);
  s.replace_ritual_scores(user, q1, vec![quarterly.clone()]).await.unwrap();
  s.replace_ritual_scores(user, march_period(), vec![]).await.unwrap();

  let rows = s.query_raw_scores(user, health.area_id, q1.range()).await.unwrap();
  assert_eq!(rows, vec![quarterly]);
}

#[tokio::test]
async fn invalid_ritual_score_keeps_the_previous_set() {
  let s = store().await;
  let user = Uuid::new_v4();
  let health = s.add_area(new_area("health", None)).await.unwrap();
  let period = march_period();

  let kept = ritual_row(user, health.area_id, period, 3.0);
  s.replace_ritual_scores(user, period, vec![kept.clone()]).await.unwrap();
  let err = s
    .replace_ritual_scores(user, period, vec![ritual_row(user, health.area_id, period, 7.0)])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(wisdom_core::Error::InvalidScore(_))));

  let rows = s.query_raw_scores(user, health.area_id, period.range()).await.unwrap();
  assert_eq!(rows, vec![kept]);
}

#[tokio::test]
async fn signals_need_a_known_area_and_dimension() {
  let s = store().await;
  let user = Uuid::new_v4();
  let missing = Uuid::new_v4();

  let err = s
    .record_raw_score(NewRawScore::new(user, missing, 3.0))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(wisdom_core::Error::AreaNotFound(id)) if id == missing));

  let err = s
    .record_entry_link(NewEntryLink {
      user_id:     user,
      entry_id:    Uuid::new_v4(),
      area_id:     missing,
      entry_kind:  "journal".into(),
      strength:    0.5,
      recorded_at: Some(march(5)),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(wisdom_core::Error::AreaNotFound(_))));

  let health = s.add_area(new_area("health", None)).await.unwrap();
  let work = s.add_area(new_area("work", None)).await.unwrap();
  let focus = s
    .add_dimension(NewDimension {
      area_id:        work.area_id,
      code:           "focus".into(),
      name:           "Focus".into(),
      weight_default: 1.0,
    })
    .await
    .unwrap();

  let mut input = NewRawScore::new(user, health.area_id, 4.0);
  input.dimension_id = Some(focus.dimension_id);
  let err = s.record_raw_score(input.clone()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(wisdom_core::Error::DimensionNotFound(id)) if id == focus.dimension_id
  ));

  input.area_id = work.area_id;
  s.record_raw_score(input).await.unwrap();
}

#[tokio::test]
async fn entry_links_are_scoped_to_the_user() {
  let s = store().await;
  let me = Uuid::new_v4();
  let other = Uuid::new_v4();
  let area = s.add_area(new_area("health", None)).await.unwrap();

  for user in [me, other, me] {
    s.record_entry_link(NewEntryLink {
      user_id:     user,
      entry_id:    Uuid::new_v4(),
      area_id:     area.area_id,
      entry_kind:  "journal".into(),
      strength:    0.8,
      recorded_at: Some(march(5)),
    })
    .await
    .unwrap();
  }

  let mine = s
    .query_entry_links(me, area.area_id, march_period().range())
    .await
    .unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().all(|l| l.user_id == me && l.entry_kind == "journal"));
}

// ─── Rituals ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ritual_keeps_its_areas_and_can_be_deactivated() {
  let s = store().await;
  let user = Uuid::new_v4();
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

  let ritual = s
    .add_ritual(NewRitual {
      user_id:  user,
      name:     "Morning pages".into(),
      cadence:  Cadence::Daily,
      area_ids: vec![a, b, a],
    })
    .await
    .unwrap();
  assert_eq!(ritual.area_ids.len(), 2);

  let fetched = s.get_ritual(ritual.ritual_id).await.unwrap().unwrap();
  assert_eq!(fetched, ritual);
  assert_eq!(s.list_active_rituals(user).await.unwrap().len(), 1);

  let deactivated = s.deactivate_ritual(ritual.ritual_id).await.unwrap().unwrap();
  assert!(!deactivated.active);
  assert!(s.list_active_rituals(user).await.unwrap().is_empty());
  assert!(s.deactivate_ritual(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn sessions_take_the_ritual_owner() {
  let s = store().await;
  let user = Uuid::new_v4();
  let ritual = s
    .add_ritual(NewRitual {
      user_id:  user,
      name:     "Run".into(),
      cadence:  Cadence::Weekly,
      area_ids: vec![Uuid::new_v4()],
    })
    .await
    .unwrap();

  let mut input = NewRitualSession::new(ritual.ritual_id, march(3));
  input.quality = Some(4);
  input.duration_minutes = Some(30);
  let session = s.record_ritual_session(input).await.unwrap();
  assert_eq!(session.user_id, user);

  let sessions = s.query_ritual_sessions(user, march_period().range()).await.unwrap();
  assert_eq!(sessions, vec![session]);
  assert!(
    s.query_ritual_sessions(Uuid::new_v4(), march_period().range())
      .await
      .unwrap()
      .is_empty()
  );
}

#[tokio::test]
async fn session_for_unknown_ritual_is_rejected() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .record_ritual_session(NewRitualSession::new(missing, march(3)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(wisdom_core::Error::RitualNotFound(id)) if id == missing));
}

#[tokio::test]
async fn session_quality_out_of_range_is_rejected() {
  let s = store().await;
  let ritual = s
    .add_ritual(NewRitual {
      user_id:  Uuid::new_v4(),
      name:     "Run".into(),
      cadence:  Cadence::Weekly,
      area_ids: vec![],
    })
    .await
    .unwrap();
  let mut input = NewRitualSession::new(ritual.ritual_id, march(3));
  input.quality = Some(6);
  assert!(s.record_ritual_session(input).await.is_err());
}

// ─── Rollups ─────────────────────────────────────────────────────────────────

fn rollup_rows(user: Uuid, areas: &[(Uuid, f64)]) -> (PeriodSummary, Vec<AreaRollup>) {
  let now = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
  let rows = areas
    .iter()
    .map(|&(area_id, score)| AreaRollup {
      user_id: user,
      area_id,
      period: march_period(),
      score,
      trend_30d: 0.0,
      strategy: ScoringStrategy::RawScores,
      weight: Some(10.0),
    })
    .collect();
  let summary = PeriodSummary {
    user_id:     user,
    period:      march_period(),
    gfs:         50.0,
    confidence:  1.0,
    computed_at: now,
  };
  (summary, rows)
}

#[tokio::test]
async fn save_rollup_replaces_previous_rows() {
  let s = store().await;
  let user = Uuid::new_v4();
  let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

  let (summary, rows) = rollup_rows(user, &[(a, 2.0), (b, 3.0)]);
  s.save_rollup(summary, rows).await.unwrap();

  let (mut summary, rows) = rollup_rows(user, &[(b, 4.0), (c, 1.0)]);
  summary.gfs = 62.5;
  s.save_rollup(summary.clone(), rows).await.unwrap();

  assert_eq!(s.get_summary(user, march_period()).await.unwrap(), Some(summary));
  let stored = s.list_area_rollups(user, march_period()).await.unwrap();
  let mut ids: Vec<Uuid> = stored.iter().map(|r| r.area_id).collect();
  ids.sort();
  let mut expected = vec![b, c];
  expected.sort();
  assert_eq!(ids, expected);
  assert_eq!(stored.iter().find(|r| r.area_id == b).unwrap().score, 4.0);
}

#[tokio::test]
async fn failed_save_rollup_leaves_nothing_behind() {
  let s = store().await;
  let user = Uuid::new_v4();
  let a = Uuid::new_v4();

  // The second row breaks the score check after the first has been written.
  let (summary, rows) = rollup_rows(user, &[(Uuid::new_v4(), 3.0), (a, 7.0)]);
  assert!(s.save_rollup(summary, rows).await.is_err());

  assert!(s.get_summary(user, march_period()).await.unwrap().is_none());
  assert!(s.list_area_rollups(user, march_period()).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_rollup_removes_summary_and_rows() {
  let s = store().await;
  let user = Uuid::new_v4();
  let (summary, rows) = rollup_rows(user, &[(Uuid::new_v4(), 2.0)]);
  s.save_rollup(summary, rows).await.unwrap();

  assert!(s.delete_rollup(user, march_period()).await.unwrap());
  assert!(!s.delete_rollup(user, march_period()).await.unwrap());
  assert!(s.get_summary(user, march_period()).await.unwrap().is_none());
  assert!(s.list_area_rollups(user, march_period()).await.unwrap().is_empty());
}

// ─── Engine over SQLite ──────────────────────────────────────────────────────

#[tokio::test]
async fn engine_rollup_is_idempotent_on_sqlite() {
  let s = Arc::new(store().await);
  let engine = FulfillmentEngine::new(Arc::clone(&s));
  let user = Uuid::new_v4();

  let health = s.add_area(new_area("health", Some(30.0))).await.unwrap();
  s.add_area(new_area("work", Some(10.0))).await.unwrap();
  for (day, v) in [(3, 3.0), (17, 4.0)] {
    let mut input = NewRawScore::new(user, health.area_id, v);
    input.recorded_at = Some(march(day));
    s.record_raw_score(input).await.unwrap();
  }

  let now = Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap();
  let first = engine.run_full_rollup_at(user, "2025-03", None, now).await.unwrap();
  let second = engine.run_full_rollup_at(user, "2025-03", None, now).await.unwrap();
  assert_eq!(first, second);

  // health 3.5 at weight 30, work no-data counted as zero at weight 10.
  assert_eq!(first.gfs, 52.5);
  assert_eq!(first.confidence, 0.5);

  let loaded = engine.load_rollup(user, march_period()).await.unwrap().unwrap();
  assert_eq!(loaded, first);

  // Wall-clock reruns leave the stored area rows untouched.
  let rows = s.list_area_rollups(user, march_period()).await.unwrap();
  engine.run_full_rollup(user, "2025-03", None).await.unwrap();
  assert_eq!(s.list_area_rollups(user, march_period()).await.unwrap(), rows);
}
