//! Handler for `GET /health`.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use dram_core::store::TastingStore;
use serde_json::json;

/// `GET /health`: reports database reachability and the whiskey count.
///
/// Never an [`crate::ApiError`]: a failing store is itself the answer.
pub async fn handler<S>(State(store): State<Arc<S>>) -> impl IntoResponse
where
  S: TastingStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  match store.count_whiskeys().await {
    Ok(n) => (
      StatusCode::OK,
      Json(json!({ "status": "ok", "database": "connected", "whiskeys": n })),
    ),
    Err(e) => {
      tracing::warn!(error = %e, "health check failed");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
          "status": "error",
          "database": "disconnected",
          "error": e.to_string(),
        })),
      )
    }
  }
}
