//! Handlers for `/whiskeys` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/whiskeys/search` | `?q=<text>[&limit=<n>]` (limit ≤ 100); 400 if `q` is blank |
//! | `GET`  | `/whiskeys/{id}/descriptors` | Aggregates with provenance; 404 if unknown |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use dram_core::{
  assignment::AggregatedDescriptor,
  review::{Whiskey, WhiskeyId},
  store::TastingStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

fn search_limit(requested: Option<usize>) -> usize {
  requested.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

/// URL-friendly form of a whiskey name: lowercase, spaces to `-`,
/// parentheses dropped.
pub fn slug(name: &str) -> String {
  name
    .to_lowercase()
    .replace(' ', "-")
    .replace(['(', ')'], "")
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub q:     Option<String>,
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
  pub whiskey_id: WhiskeyId,
  pub name:       String,
  pub distillery: Option<String>,
  pub slug:       String,
}

impl From<Whiskey> for SearchHit {
  fn from(w: Whiskey) -> Self {
    Self {
      slug:       slug(&w.name),
      whiskey_id: w.whiskey_id,
      name:       w.name,
      distillery: w.distillery,
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
  pub query:   String,
  pub count:   usize,
  pub results: Vec<SearchHit>,
}

/// `GET /whiskeys/search?q=<text>[&limit=<n>]`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError>
where
  S: TastingStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = params.q.as_deref().map(str::trim).unwrap_or_default().to_owned();
  if query.is_empty() {
    return Err(ApiError::BadRequest("query parameter 'q' is required".into()));
  }

  let results: Vec<SearchHit> = store
    .search_whiskeys(query.clone(), search_limit(params.limit))
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(SearchHit::from)
    .collect();

  Ok(Json(SearchResponse { query, count: results.len(), results }))
}

// ─── Descriptors ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct DescriptorsResponse {
  pub whiskey:     Whiskey,
  pub descriptors: Vec<AggregatedDescriptor>,
}

/// `GET /whiskeys/{id}/descriptors`
pub async fn descriptors<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<DescriptorsResponse>, ApiError>
where
  S: TastingStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = WhiskeyId(id);
  let whiskey = store
    .get_whiskey(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("whiskey {id}")))?;

  let descriptors = store.whiskey_descriptors(id).await.map_err(ApiError::store)?;
  Ok(Json(DescriptorsResponse { whiskey, descriptors }))
}
