//! The `FulfillmentStore` trait.
//!
//! The trait is implemented by storage backends ([`MemoryStore`] here,
//! `wisdom-store-sqlite` for durable storage). The scoring engine depends only
//! on this abstraction, never on a concrete backend.
//!
//! [`MemoryStore`]: crate::memory::MemoryStore

use std::future::Future;

use uuid::Uuid;

use crate::{
  area::{Area, Dimension, NewArea, NewDimension},
  period::{Period, TimeRange},
  ritual::{NewRitual, NewRitualSession, Ritual, RitualSession},
  rollup::{AreaRollup, PeriodSummary},
  signal::{EntryLink, NewEntryLink, NewRawScore, RawScore},
};

/// Abstraction over a WisdomOS fulfillment store backend.
///
/// Raw signals are append-only. Rollups are caches, written through
/// [`save_rollup`](FulfillmentStore::save_rollup) as one atomic unit.
///
/// Range queries return rows ordered by timestamp, then id.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait FulfillmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Areas & weights ───────────────────────────────────────────────────

  fn add_area(
    &self,
    input: NewArea,
  ) -> impl Future<Output = Result<Area, Self::Error>> + Send + '_;

  fn get_area(
    &self,
    area_id: Uuid,
  ) -> impl Future<Output = Result<Option<Area>, Self::Error>> + Send + '_;

  /// Active areas visible to `user_id`: global canonical areas plus the
  /// user's own.
  fn list_areas(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Area>, Self::Error>> + Send + '_;

  /// Set (or replace) a user's weight override for an area.
  fn set_custom_weight(
    &self,
    user_id: Uuid,
    area_id: Uuid,
    weight: f64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_custom_weight(
    &self,
    user_id: Uuid,
    area_id: Uuid,
  ) -> impl Future<Output = Result<Option<f64>, Self::Error>> + Send + '_;

  /// Remove an override. Returns `false` if there was none.
  fn delete_custom_weight(
    &self,
    user_id: Uuid,
    area_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn add_dimension(
    &self,
    input: NewDimension,
  ) -> impl Future<Output = Result<Dimension, Self::Error>> + Send + '_;

  fn list_dimensions(
    &self,
    area_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Dimension>, Self::Error>> + Send + '_;

  // ── Raw signals ───────────────────────────────────────────────────────

  /// Record a submitted score. The timestamp defaults to now. Fails if the
  /// area is unknown, or if `dimension_id` does not belong to it.
  fn record_raw_score(
    &self,
    input: NewRawScore,
  ) -> impl Future<Output = Result<RawScore, Self::Error>> + Send + '_;

  /// Atomically swap the ritual-derived scores of (user, period) for
  /// `scores`. The previous set is every `ritual_tracking` score of the user
  /// stamped at [`Period::last_instant`] whose id is the
  /// [`ritual_score_id`](crate::signal::ritual_score_id) of its area.
  fn replace_ritual_scores(
    &self,
    user_id: Uuid,
    period: Period,
    scores: Vec<RawScore>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn query_raw_scores(
    &self,
    user_id: Uuid,
    area_id: Uuid,
    range: TimeRange,
  ) -> impl Future<Output = Result<Vec<RawScore>, Self::Error>> + Send + '_;

  /// Fails if the area is unknown.
  fn record_entry_link(
    &self,
    input: NewEntryLink,
  ) -> impl Future<Output = Result<EntryLink, Self::Error>> + Send + '_;

  fn query_entry_links(
    &self,
    user_id: Uuid,
    area_id: Uuid,
    range: TimeRange,
  ) -> impl Future<Output = Result<Vec<EntryLink>, Self::Error>> + Send + '_;

  // ── Rituals ───────────────────────────────────────────────────────────

  fn add_ritual(
    &self,
    input: NewRitual,
  ) -> impl Future<Output = Result<Ritual, Self::Error>> + Send + '_;

  fn get_ritual(
    &self,
    ritual_id: Uuid,
  ) -> impl Future<Output = Result<Option<Ritual>, Self::Error>> + Send + '_;

  /// Soft-deactivate a ritual. Returns the updated ritual, or `None` if it
  /// does not exist.
  fn deactivate_ritual(
    &self,
    ritual_id: Uuid,
  ) -> impl Future<Output = Result<Option<Ritual>, Self::Error>> + Send + '_;

  fn list_active_rituals(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Ritual>, Self::Error>> + Send + '_;

  /// Record a completion. Fails if the ritual does not exist.
  fn record_ritual_session(
    &self,
    input: NewRitualSession,
  ) -> impl Future<Output = Result<RitualSession, Self::Error>> + Send + '_;

  fn query_ritual_sessions(
    &self,
    user_id: Uuid,
    range: TimeRange,
  ) -> impl Future<Output = Result<Vec<RitualSession>, Self::Error>> + Send + '_;

  // ── Rollups ───────────────────────────────────────────────────────────

  /// Atomically upsert the summary and every area row for one
  /// (user, period). Area rows for that (user, period) not present in
  /// `areas` are removed. Either everything is written or nothing is.
  fn save_rollup(
    &self,
    summary: PeriodSummary,
    areas: Vec<AreaRollup>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_summary(
    &self,
    user_id: Uuid,
    period: Period,
  ) -> impl Future<Output = Result<Option<PeriodSummary>, Self::Error>> + Send + '_;

  fn list_area_rollups(
    &self,
    user_id: Uuid,
    period: Period,
  ) -> impl Future<Output = Result<Vec<AreaRollup>, Self::Error>> + Send + '_;

  /// Drop the cached rollup for (user, period). Returns `false` if there was
  /// none.
  fn delete_rollup(
    &self,
    user_id: Uuid,
    period: Period,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
