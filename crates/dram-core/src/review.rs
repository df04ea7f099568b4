//! Whiskeys and the reviews written about them.
//!
//! Reviews arrive from the scraping layer as raw per-section text. The core
//! only ever reads them.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::descriptor::Section;

// ─── Identifiers ─────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WhiskeyId(pub i64);

impl fmt::Display for WhiskeyId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReviewId(pub i64);

impl fmt::Display for ReviewId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Whiskey ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Whiskey {
  pub whiskey_id: WhiskeyId,
  pub name:       String,
  pub distillery: Option<String>,
}

// ─── Review text ─────────────────────────────────────────────────────────────

/// The raw tasting-note text of a review, one optional field per section.
///
/// Each field is either pipe-delimited (`"Caramel | Vanilla | Oak"`) or a
/// prose paragraph; the shape is decided per field, not per review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewText {
  pub nose:   Option<String>,
  pub palate: Option<String>,
  pub finish: Option<String>,
}

impl ReviewText {
  pub fn section(&self, section: Section) -> Option<&str> {
    match section {
      Section::Nose => self.nose.as_deref(),
      Section::Palate => self.palate.as_deref(),
      Section::Finish => self.finish.as_deref(),
    }
  }
}

// ─── Review ──────────────────────────────────────────────────────────────────

/// A stored review with its owning whiskey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub review_id:   ReviewId,
  pub whiskey_id:  WhiskeyId,
  pub source_site: String,
  pub source_url:  Option<String>,
  pub review_date: Option<NaiveDate>,
  pub text:        ReviewText,
}

/// Input to [`crate::store::TastingStore::add_review`]; the id is assigned by
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
  pub whiskey_id:  WhiskeyId,
  pub source_site: String,
  pub source_url:  Option<String>,
  pub review_date: Option<NaiveDate>,
  #[serde(flatten)]
  pub text:        ReviewText,
}

/// Where a whiskey's reviews were published; shown alongside a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReview {
  pub site: String,
  pub url:  String,
}
