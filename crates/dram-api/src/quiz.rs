//! Handler for `GET /quiz/{id}` and the option selection behind it.
//!
//! Each section of a quiz offers nine descriptors: up to six the whiskey was
//! actually described with (most-cited first), padded with descriptors other
//! whiskeys were described with in the same section. Options are shuffled so
//! correct answers are not always first.

use std::{collections::HashSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, State},
};
use dram_core::{
  assignment::SectionDescriptor,
  descriptor::{DescriptorId, Section},
  review::{SourceReview, WhiskeyId},
  store::TastingStore,
};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const OPTIONS_PER_SECTION: usize = 9;
pub const MAX_CORRECT: usize = 6;

// ─── Response types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
  pub id:      DescriptorId,
  pub name:    String,
  pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionQuiz {
  pub options:       Vec<QuizOption>,
  pub correct_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
  pub nose:   SectionQuiz,
  pub palate: SectionQuiz,
  pub finish: SectionQuiz,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizWhiskey {
  pub id:         WhiskeyId,
  pub name:       String,
  pub distillery: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
  pub whiskey:        QuizWhiskey,
  pub quiz:           Quiz,
  pub source_reviews: Vec<SourceReview>,
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// Pick and shuffle the options for one section.
///
/// `correct` must be non-empty; distractors that are also correct are
/// ignored. When there are too few distractors the section simply has fewer
/// than [`OPTIONS_PER_SECTION`] options.
pub fn select_options<R: Rng + ?Sized>(
  correct: &[SectionDescriptor],
  distractors: &[SectionDescriptor],
  rng: &mut R,
) -> SectionQuiz {
  let mut ranked: Vec<&SectionDescriptor> = correct.iter().collect();
  ranked.sort_by(|a, b| b.review_count.cmp(&a.review_count).then_with(|| a.name.cmp(&b.name)));
  ranked.truncate(MAX_CORRECT);

  let correct_ids: HashSet<DescriptorId> = correct.iter().map(|d| d.descriptor_id).collect();
  let mut pool: Vec<&SectionDescriptor> = distractors
    .iter()
    .filter(|d| !correct_ids.contains(&d.descriptor_id))
    .collect();
  pool.shuffle(rng);
  pool.truncate(OPTIONS_PER_SECTION - ranked.len());

  let mut options: Vec<QuizOption> = ranked
    .iter()
    .map(|d| QuizOption { id: d.descriptor_id, name: d.name.clone(), correct: true })
    .chain(
      pool
        .iter()
        .map(|d| QuizOption { id: d.descriptor_id, name: d.name.clone(), correct: false }),
    )
    .collect();
  options.shuffle(rng);

  SectionQuiz { options, correct_count: ranked.len() }
}

/// Per-section inputs read from the store, in [`Section::ALL`] order.
struct SectionInputs {
  correct:     Vec<SectionDescriptor>,
  distractors: Vec<SectionDescriptor>,
}

fn build_quiz<R: Rng + ?Sized>(inputs: &[SectionInputs; 3], rng: &mut R) -> Quiz {
  let [nose, palate, finish] =
    inputs.each_ref().map(|s| select_options(&s.correct, &s.distractors, rng));
  Quiz { nose, palate, finish }
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `GET /quiz/{id}`
///
/// 404 when the whiskey is unknown or when any section has no aggregated
/// descriptors; a quiz is never served with zero correct answers.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<QuizResponse>, ApiError>
where
  S: TastingStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = WhiskeyId(id);
  let whiskey = store
    .get_whiskey(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("whiskey with id {id} not found")))?;

  let source_reviews = store.source_reviews(id).await.map_err(ApiError::store)?;

  let mut inputs = Vec::with_capacity(Section::ALL.len());
  for section in Section::ALL {
    let correct = store
      .section_descriptors(id, section)
      .await
      .map_err(ApiError::store)?;
    if correct.is_empty() {
      tracing::debug!(whiskey_id = %id, %section, "no aggregated descriptors");
      return Err(ApiError::NotFound(format!(
        "no {section} tasting data available for whiskey {id}"
      )));
    }
    let distractors = store
      .distractor_candidates(id, section)
      .await
      .map_err(ApiError::store)?;
    inputs.push(SectionInputs { correct, distractors });
  }

  let inputs: [SectionInputs; 3] = inputs
    .try_into()
    .map_err(|_| ApiError::NotFound(format!("incomplete tasting data for whiskey {id}")))?;
  let quiz = build_quiz(&inputs, &mut rand::rng());

  Ok(Json(QuizResponse {
    whiskey: QuizWhiskey {
      id:         whiskey.whiskey_id,
      name:       whiskey.name,
      distillery: whiskey.distillery,
    },
    quiz,
    source_reviews,
  }))
}
