//! JSON API for the dram tasting quiz.
//!
//! Exposes an axum [`Router`] backed by any [`dram_core::store::TastingStore`].
//! Only aggregated results are read here; extraction happens offline.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dram_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod health;
pub mod quiz;
pub mod whiskeys;

use std::sync::Arc;

use axum::{Router, routing::get};
use dram_core::store::TastingStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Routes for the quiz frontend, with `store` already applied as state.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TastingStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/health", get(health::handler::<S>))
    // Whiskeys
    .route("/whiskeys/search", get(whiskeys::search::<S>))
    .route("/whiskeys/{id}/descriptors", get(whiskeys::descriptors::<S>))
    // Quiz
    .route("/quiz/{id}", get(quiz::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}

#[cfg(test)]
mod tests;
