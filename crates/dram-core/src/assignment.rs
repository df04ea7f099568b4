//! Extracted facts: per-review assignments and their per-whiskey aggregates.
//!
//! Neither type is ever updated in place. Both tables are cleared and
//! repopulated wholesale whenever the vocabulary or extraction rules change.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  descriptor::{DescriptorId, Section},
  review::{ReviewId, WhiskeyId},
};

// ─── Method ──────────────────────────────────────────────────────────────────

/// Which extraction path produced an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
  /// Author-segmented `|` list; confidence is always 1.0.
  PipeDelimited,
  /// Heuristic prose extraction; confidence in `[0.6, 1.0]`.
  ProseConservative,
}

impl ExtractionMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::PipeDelimited => "pipe_delimited",
      Self::ProseConservative => "prose_conservative",
    }
  }
}

impl fmt::Display for ExtractionMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ExtractionMethod {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pipe_delimited" => Ok(Self::PipeDelimited),
      "prose_conservative" => Ok(Self::ProseConservative),
      other => Err(Error::UnknownMethod(other.to_owned())),
    }
  }
}

// ─── Per-section extraction result ───────────────────────────────────────────

/// One descriptor found in one section of text, before it is tied to a
/// review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDescriptor {
  pub descriptor_id: DescriptorId,
  pub confidence:    f64,
  pub method:        ExtractionMethod,
}

// ─── Assignment ──────────────────────────────────────────────────────────────

/// "Descriptor `d` was mentioned in `section` of review `r`."
///
/// At most one exists per (review, section, descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptorAssignment {
  pub review_id:     ReviewId,
  pub descriptor_id: DescriptorId,
  pub section:       Section,
  pub confidence:    f64,
  pub method:        ExtractionMethod,
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

/// "Descriptor `d` was mentioned in `section` across these reviews of
/// whiskey `w`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedDescriptor {
  pub whiskey_id:    WhiskeyId,
  pub descriptor_id: DescriptorId,
  pub section:       Section,
  /// Sorted ascending, no duplicates.
  pub review_ids:    Vec<ReviewId>,
  /// Always `review_ids.len()`, and never zero.
  pub review_count:  usize,
}

/// An aggregate joined with its descriptor name, as read back for quizzes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
  pub descriptor_id: DescriptorId,
  pub name:          String,
  pub review_count:  usize,
}
