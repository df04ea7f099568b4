//! The result of a full extraction rebuild, as handed to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  assignment::{AggregatedDescriptor, DescriptorAssignment},
  review::{ReviewId, WhiskeyId},
};

/// A review whose extraction confidence fell below the manual-review
/// threshold. Advisory only: its assignments are persisted regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFlag {
  pub review_id:        ReviewId,
  pub whiskey_id:       WhiskeyId,
  pub confidence:       f64,
  pub descriptor_count: usize,
}

/// Counters reported after every rebuild (dry run or not).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildStats {
  pub reviews:             usize,
  pub pipe_sections:       usize,
  pub prose_sections:      usize,
  pub assignments:         usize,
  pub aggregates:          usize,
  pub flagged_reviews:     usize,
  /// Reviews for which no section yielded a single descriptor.
  pub empty_reviews:       usize,
  /// Assignments dropped by the aggregator for lack of a whiskey mapping.
  pub skipped_assignments: usize,
}

/// Everything a rebuild produces. Committed atomically: the store clears
/// both fact tables and repopulates them from this value.
#[derive(Debug, Clone)]
pub struct RebuildOutput {
  pub run:         RebuildRun,
  pub assignments: Vec<DescriptorAssignment>,
  pub aggregates:  Vec<AggregatedDescriptor>,
  pub flags:       Vec<ReviewFlag>,
}

/// Bookkeeping record for one rebuild, kept for QA tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuildRun {
  pub run_id:      Uuid,
  pub started_at:  DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub stats:       RebuildStats,
}
