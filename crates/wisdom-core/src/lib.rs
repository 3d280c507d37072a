//! Core types, the repository trait and the fulfillment scoring engine for
//! WisdomOS.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::FulfillmentStore`]; the API and the
//! server binary drive [`engine::FulfillmentEngine`] through it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod area;
pub mod engine;
pub mod error;
pub mod memory;
pub mod period;
pub mod ritual;
pub mod rollup;
pub mod score;
pub mod signal;
pub mod store;

pub use error::{Error, Result};
