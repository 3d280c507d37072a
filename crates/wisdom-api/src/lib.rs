//! JSON REST API for the WisdomOS fulfillment engine.
//!
//! Exposes an axum [`Router`] backed by a [`FulfillmentEngine`] over any
//! [`wisdom_core::store::FulfillmentStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility; callers pass the acting `user_id`
//! explicitly.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", wisdom_api::api_router(engine.clone()))
//! ```

pub mod areas;
pub mod error;
pub mod rituals;
pub mod rollups;
pub mod signals;

use axum::{
  Router,
  routing::{get, post, put},
};
use wisdom_core::{engine::FulfillmentEngine, store::FulfillmentStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: FulfillmentEngine<S>) -> Router<()>
where
  S: FulfillmentStore + 'static,
{
  Router::new()
    // Areas
    .route("/areas", get(areas::list::<S>).post(areas::create::<S>))
    .route(
      "/areas/{id}/dimensions",
      get(areas::list_dimensions::<S>).post(areas::add_dimension::<S>),
    )
    .route(
      "/areas/{id}/weight",
      put(areas::set_weight::<S>).delete(areas::clear_weight::<S>),
    )
    .route("/areas/{id}/rollup", get(areas::rollup::<S>))
    // Raw signals
    .route("/scores", post(signals::record_score::<S>))
    .route("/entry-links", post(signals::record_entry_link::<S>))
    // Rituals
    .route("/rituals", get(rituals::list::<S>).post(rituals::create::<S>))
    .route(
      "/rituals/impact",
      get(rituals::impact::<S>).post(rituals::persist_impact::<S>),
    )
    .route("/rituals/{id}/deactivate", post(rituals::deactivate::<S>))
    .route("/rituals/{id}/sessions", post(rituals::record_session::<S>))
    // Rollups
    .route("/rollups", post(rollups::run::<S>))
    .route(
      "/rollups/{user_id}/{period}",
      get(rollups::get_one::<S>).delete(rollups::delete_one::<S>),
    )
    .with_state(engine)
}
