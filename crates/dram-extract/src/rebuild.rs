//! Full re-extraction of every review, followed by aggregation.
//!
//! The result is handed to the store as a single value and committed
//! atomically; nothing here performs I/O.

use std::collections::HashMap;

use chrono::Utc;
use dram_core::{
  rebuild::{RebuildOutput, RebuildRun, RebuildStats, ReviewFlag},
  review::{Review, ReviewId, WhiskeyId},
};
use uuid::Uuid;

use crate::{
  Result,
  aggregate::aggregate,
  extract::Extractor,
  matcher::MatcherOptions,
  vocabulary::Vocabulary,
};

pub fn rebuild(
  vocabulary: &Vocabulary,
  reviews: &[Review],
  review_whiskey: &HashMap<ReviewId, WhiskeyId>,
  options: &MatcherOptions,
) -> Result<RebuildOutput> {
  let started_at = Utc::now();
  let run_id = Uuid::new_v4();
  tracing::info!(
    %run_id,
    reviews = reviews.len(),
    descriptors = vocabulary.len(),
    "rebuild started"
  );

  let extractor = Extractor::new(vocabulary, options.clone())?;
  let mut stats = RebuildStats { reviews: reviews.len(), ..Default::default() };
  let mut assignments = Vec::new();
  let mut flags = Vec::new();

  for review in reviews {
    let extraction = extractor.extract_review(review.review_id, &review.text);
    stats.pipe_sections += extraction.pipe_sections;
    stats.prose_sections += extraction.prose_sections;
    if extraction.assignments.is_empty() {
      stats.empty_reviews += 1;
    }

    if extraction.needs_manual_review() {
      let confidence = extraction.confidence.unwrap_or_default();
      tracing::debug!(
        review_id = %review.review_id,
        confidence,
        descriptors = extraction.assignments.len(),
        "review needs manual review"
      );
      flags.push(ReviewFlag {
        review_id: review.review_id,
        whiskey_id: review.whiskey_id,
        confidence,
        descriptor_count: extraction.assignments.len(),
      });
    }

    assignments.extend(extraction.assignments);
  }

  let aggregation = aggregate(&assignments, review_whiskey);

  stats.assignments = assignments.len();
  stats.aggregates = aggregation.descriptors.len();
  stats.flagged_reviews = flags.len();
  stats.skipped_assignments = aggregation.skipped;

  tracing::info!(
    %run_id,
    assignments = stats.assignments,
    aggregates = stats.aggregates,
    flagged = stats.flagged_reviews,
    empty = stats.empty_reviews,
    "rebuild finished"
  );

  Ok(RebuildOutput {
    run: RebuildRun { run_id, started_at, finished_at: Utc::now(), stats },
    assignments,
    aggregates: aggregation.descriptors,
    flags,
  })
}
