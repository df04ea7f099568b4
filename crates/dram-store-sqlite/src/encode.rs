//! Column encodings for the dram tables, and the `Raw*` rows read back from
//! them.
//!
//! Timestamps are RFC 3339 strings, review dates are `YYYY-MM-DD`, run ids are
//! hyphenated UUIDs. Section sets, provenance lists, and run statistics are
//! compact JSON.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use dram_core::{
  assignment::{AggregatedDescriptor, DescriptorAssignment, SectionDescriptor},
  descriptor::{DescriptorId, DescriptorTerm, Section},
  rebuild::{RebuildRun, RebuildStats, ReviewFlag},
  review::{Review, ReviewId, ReviewText, Whiskey, WhiskeyId},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Sections ────────────────────────────────────────────────────────────────

pub fn encode_sections(sections: &BTreeSet<Section>) -> Result<String> {
  Ok(serde_json::to_string(sections)?)
}

pub fn decode_sections(s: &str) -> Result<BTreeSet<Section>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Provenance ──────────────────────────────────────────────────────────────

pub fn encode_review_ids(ids: &[ReviewId]) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

pub fn decode_review_ids(s: &str) -> Result<Vec<ReviewId>> {
  Ok(serde_json::from_str(s)?)
}

/// SQLite integers are signed 64-bit; larger values saturate rather than
/// wrapping negative (a negative `LIMIT` means "no limit").
pub fn encode_count(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_count(n: i64) -> usize { n.max(0) as usize }

// ─── Row types ───────────────────────────────────────────────────────────────

/// A `descriptor_vocabulary` row.
pub struct RawDescriptor {
  pub descriptor_id: i64,
  pub name:          String,
  pub sections:      String,
  pub active:        bool,
}

impl RawDescriptor {
  pub fn into_term(self) -> Result<DescriptorTerm> {
    let descriptor_id = DescriptorId(self.descriptor_id);
    let applicable_sections = decode_sections(&self.sections)?;
    if applicable_sections.is_empty() {
      return Err(dram_core::Error::EmptySections(descriptor_id).into());
    }
    Ok(DescriptorTerm {
      descriptor_id,
      name: self.name,
      applicable_sections,
      active: self.active,
    })
  }
}

/// A `whiskeys` row.
pub struct RawWhiskey {
  pub whiskey_id: i64,
  pub name:       String,
  pub distillery: Option<String>,
}

impl RawWhiskey {
  pub fn into_whiskey(self) -> Whiskey {
    Whiskey {
      whiskey_id: WhiskeyId(self.whiskey_id),
      name:       self.name,
      distillery: self.distillery,
    }
  }
}

/// A `reviews` row.
pub struct RawReview {
  pub review_id:   i64,
  pub whiskey_id:  i64,
  pub source_site: String,
  pub source_url:  Option<String>,
  pub review_date: Option<String>,
  pub nose:        Option<String>,
  pub palate:      Option<String>,
  pub finish:      Option<String>,
}

impl RawReview {
  pub fn into_review(self) -> Result<Review> {
    Ok(Review {
      review_id:   ReviewId(self.review_id),
      whiskey_id:  WhiskeyId(self.whiskey_id),
      source_site: self.source_site,
      source_url:  self.source_url,
      review_date: self.review_date.as_deref().map(decode_date).transpose()?,
      text:        ReviewText {
        nose:   self.nose,
        palate: self.palate,
        finish: self.finish,
      },
    })
  }
}

/// A `review_descriptors` row.
pub struct RawAssignment {
  pub review_id:     i64,
  pub descriptor_id: i64,
  pub section:       String,
  pub confidence:    f64,
  pub method:        String,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<DescriptorAssignment> {
    Ok(DescriptorAssignment {
      review_id:     ReviewId(self.review_id),
      descriptor_id: DescriptorId(self.descriptor_id),
      section:       self.section.parse()?,
      confidence:    self.confidence,
      method:        self.method.parse()?,
    })
  }
}

/// An `aggregated_whiskey_descriptors` row.
pub struct RawAggregate {
  pub whiskey_id:    i64,
  pub descriptor_id: i64,
  pub section:       String,
  pub review_count:  i64,
  pub review_ids:    String,
}

impl RawAggregate {
  pub fn into_aggregate(self) -> Result<AggregatedDescriptor> {
    Ok(AggregatedDescriptor {
      whiskey_id:    WhiskeyId(self.whiskey_id),
      descriptor_id: DescriptorId(self.descriptor_id),
      section:       self.section.parse()?,
      review_ids:    decode_review_ids(&self.review_ids)?,
      review_count:  decode_count(self.review_count),
    })
  }
}

/// An aggregate joined with its descriptor name.
pub struct RawSectionDescriptor {
  pub descriptor_id: i64,
  pub name:          String,
  pub review_count:  i64,
}

impl RawSectionDescriptor {
  pub fn into_section_descriptor(self) -> SectionDescriptor {
    SectionDescriptor {
      descriptor_id: DescriptorId(self.descriptor_id),
      name:          self.name,
      review_count:  decode_count(self.review_count),
    }
  }
}

/// A `rebuild_runs` row.
pub struct RawRun {
  pub run_id:      String,
  pub started_at:  String,
  pub finished_at: String,
  pub stats:       String,
}

impl RawRun {
  pub fn into_run(self) -> Result<RebuildRun> {
    let stats: RebuildStats = serde_json::from_str(&self.stats)?;
    Ok(RebuildRun {
      run_id: decode_uuid(&self.run_id)?,
      started_at: decode_dt(&self.started_at)?,
      finished_at: decode_dt(&self.finished_at)?,
      stats,
    })
  }
}

/// A `review_flags` row.
pub struct RawFlag {
  pub review_id:        i64,
  pub whiskey_id:       i64,
  pub confidence:       f64,
  pub descriptor_count: i64,
}

impl RawFlag {
  pub fn into_flag(self) -> ReviewFlag {
    ReviewFlag {
      review_id:        ReviewId(self.review_id),
      whiskey_id:       WhiskeyId(self.whiskey_id),
      confidence:       self.confidence,
      descriptor_count: decode_count(self.descriptor_count),
    }
  }
}
