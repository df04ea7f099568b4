//! The `TastingStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `dram-store-sqlite`).
//! The extraction pipeline, the API, and the binary depend on this
//! abstraction, not on any concrete backend.

use std::{collections::HashMap, future::Future};

use uuid::Uuid;

use crate::{
  assignment::{AggregatedDescriptor, DescriptorAssignment, SectionDescriptor},
  descriptor::{DescriptorId, DescriptorTerm, Section},
  rebuild::{RebuildOutput, RebuildRun, ReviewFlag},
  review::{NewReview, Review, ReviewId, ReviewText, SourceReview, Whiskey, WhiskeyId},
};

/// Abstraction over a dram store backend.
///
/// Assignments and aggregates are never written piecemeal: the only write
/// path for them is [`TastingStore::commit_rebuild`], which replaces both
/// tables in one transaction.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TastingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Vocabulary ────────────────────────────────────────────────────────

  /// Add a descriptor to the vocabulary. The name is normalised; an empty
  /// section set is rejected.
  fn add_descriptor(
    &self,
    name: String,
    sections: Vec<Section>,
  ) -> impl Future<Output = Result<DescriptorTerm, Self::Error>> + Send + '_;

  /// Mark a descriptor inactive. Returns `false` if it does not exist.
  fn deactivate_descriptor(
    &self,
    id: DescriptorId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All active descriptors, longest name first.
  fn list_active_descriptors(
    &self,
  ) -> impl Future<Output = Result<Vec<DescriptorTerm>, Self::Error>> + Send + '_;

  // ── Whiskeys ──────────────────────────────────────────────────────────

  /// Return the whiskey with this name (case-insensitive), creating it if
  /// needed.
  fn find_or_create_whiskey(
    &self,
    name: String,
    distillery: Option<String>,
  ) -> impl Future<Output = Result<Whiskey, Self::Error>> + Send + '_;

  fn get_whiskey(
    &self,
    id: WhiskeyId,
  ) -> impl Future<Output = Result<Option<Whiskey>, Self::Error>> + Send + '_;

  /// Name substring search, ordered by name.
  fn search_whiskeys(
    &self,
    query: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Whiskey>, Self::Error>> + Send + '_;

  fn count_whiskeys(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  fn add_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  fn get_review_text(
    &self,
    id: ReviewId,
  ) -> impl Future<Output = Result<Option<ReviewText>, Self::Error>> + Send + '_;

  fn list_reviews(
    &self,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;

  fn review_whiskey_map(
    &self,
  ) -> impl Future<Output = Result<HashMap<ReviewId, WhiskeyId>, Self::Error>>
  + Send
  + '_;

  /// Distinct published sources for a whiskey's reviews, ordered by site.
  fn source_reviews(
    &self,
    whiskey_id: WhiskeyId,
  ) -> impl Future<Output = Result<Vec<SourceReview>, Self::Error>> + Send + '_;

  // ── Rebuild ───────────────────────────────────────────────────────────

  /// Clear all assignments and aggregates and repopulate them from
  /// `output`, recording the run and its flags, in a single transaction.
  fn commit_rebuild(
    &self,
    output: RebuildOutput,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_assignments(
    &self,
  ) -> impl Future<Output = Result<Vec<DescriptorAssignment>, Self::Error>>
  + Send
  + '_;

  /// Most recently finished rebuild, if any.
  fn latest_run(
    &self,
  ) -> impl Future<Output = Result<Option<RebuildRun>, Self::Error>> + Send + '_;

  fn run_flags(
    &self,
    run_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReviewFlag>, Self::Error>> + Send + '_;

  // ── Aggregate reads ───────────────────────────────────────────────────

  /// Every aggregate for a whiskey, with provenance.
  fn whiskey_descriptors(
    &self,
    whiskey_id: WhiskeyId,
  ) -> impl Future<Output = Result<Vec<AggregatedDescriptor>, Self::Error>>
  + Send
  + '_;

  /// The whiskey's descriptors for one section, most-cited first, then by
  /// name.
  fn section_descriptors(
    &self,
    whiskey_id: WhiskeyId,
    section: Section,
  ) -> impl Future<Output = Result<Vec<SectionDescriptor>, Self::Error>> + Send + '_;

  /// Descriptors aggregated for *other* whiskeys in `section` that this
  /// whiskey does not have there, ordered by name.
  fn distractor_candidates(
    &self,
    whiskey_id: WhiskeyId,
    section: Section,
  ) -> impl Future<Output = Result<Vec<SectionDescriptor>, Self::Error>> + Send + '_;
}
