//! Section routing: decide which extraction path a piece of text takes and
//! turn its output into confidence-scored descriptors.

use std::collections::HashSet;

use dram_core::{
  assignment::{DescriptorAssignment, ExtractedDescriptor, ExtractionMethod},
  descriptor::Section,
  review::{ReviewId, ReviewText},
};

use crate::{
  Result,
  matcher::{MatcherOptions, PipeMatcher},
  prose::{self, ProseExtractor},
  vocabulary::Vocabulary,
};

/// How a section's text will be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextShape {
  Absent,
  PipeDelimited,
  Prose,
}

/// A `|` anywhere marks author-segmented text; anything else non-blank is
/// prose.
pub fn classify(text: Option<&str>) -> TextShape {
  match text {
    None => TextShape::Absent,
    Some(t) if t.trim().is_empty() => TextShape::Absent,
    Some(t) if t.contains('|') => TextShape::PipeDelimited,
    Some(_) => TextShape::Prose,
  }
}

/// Everything extracted from one review.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewExtraction {
  pub assignments:    Vec<DescriptorAssignment>,
  pub pipe_sections:  usize,
  pub prose_sections: usize,
  /// Review-level confidence; `None` only when every section was absent.
  pub confidence:     Option<f64>,
}

impl ReviewExtraction {
  pub fn needs_manual_review(&self) -> bool {
    self.confidence.is_some_and(prose::needs_manual_review)
  }
}

pub struct Extractor<'v> {
  matcher: PipeMatcher<'v>,
  prose:   ProseExtractor<'v>,
}

impl<'v> Extractor<'v> {
  pub fn new(vocabulary: &'v Vocabulary, options: MatcherOptions) -> Result<Self> {
    Ok(Self {
      matcher: PipeMatcher::new(vocabulary, options),
      prose:   ProseExtractor::new(vocabulary)?,
    })
  }

  /// Extract the descriptors of one section, at most one per descriptor.
  pub fn extract_assignments(
    &self,
    text: Option<&str>,
    section: Section,
  ) -> Vec<ExtractedDescriptor> {
    match classify(text) {
      TextShape::Absent => Vec::new(),
      TextShape::PipeDelimited => self
        .matcher
        .match_section(text, section)
        .into_iter()
        .map(|descriptor_id| ExtractedDescriptor {
          descriptor_id,
          confidence: 1.0,
          method: ExtractionMethod::PipeDelimited,
        })
        .collect(),
      TextShape::Prose => {
        // Matches come back in text order; keep the first per descriptor.
        let mut seen = HashSet::new();
        self
          .prose
          .extract_section(text, section)
          .into_iter()
          .filter(|m| seen.insert(m.descriptor_id))
          .map(|m| ExtractedDescriptor {
            descriptor_id: m.descriptor_id,
            confidence:    m.confidence,
            method:        ExtractionMethod::ProseConservative,
          })
          .collect()
      }
    }
  }

  pub fn extract_review(&self, review_id: ReviewId, text: &ReviewText) -> ReviewExtraction {
    let mut out = ReviewExtraction::default();

    for section in Section::ALL {
      let raw = text.section(section);
      match classify(raw) {
        TextShape::Absent => continue,
        TextShape::PipeDelimited => out.pipe_sections += 1,
        TextShape::Prose => out.prose_sections += 1,
      }
      out.assignments.extend(self.extract_assignments(raw, section).into_iter().map(
        |e| DescriptorAssignment {
          review_id,
          descriptor_id: e.descriptor_id,
          section,
          confidence: e.confidence,
          method: e.method,
        },
      ));
    }

    if out.pipe_sections + out.prose_sections > 0 {
      let confidences: Vec<f64> = out.assignments.iter().map(|a| a.confidence).collect();
      out.confidence = Some(prose::review_confidence(&confidences));
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vocabulary::tests::{id, vocab};

  fn extractor(v: &Vocabulary) -> Extractor<'_> {
    Extractor::new(v, MatcherOptions::default()).unwrap()
  }

  #[test]
  fn classification() {
    assert_eq!(classify(None), TextShape::Absent);
    assert_eq!(classify(Some("  \n")), TextShape::Absent);
    assert_eq!(classify(Some("Oak | Vanilla")), TextShape::PipeDelimited);
    assert_eq!(classify(Some("Oak|")), TextShape::PipeDelimited);
    assert_eq!(classify(Some("Oak and vanilla")), TextShape::Prose);
  }

  #[test]
  fn pipe_text_has_full_confidence() {
    let v = vocab(&["oak", "vanilla"]);
    let got = extractor(&v).extract_assignments(Some("Oak | Vanilla"), Section::Nose);
    assert_eq!(got.len(), 2);
    assert!(got.iter().all(|e| e.confidence == 1.0));
    assert!(got.iter().all(|e| e.method == ExtractionMethod::PipeDelimited));
  }

  #[test]
  fn prose_keeps_first_occurrence_per_descriptor() {
    let v = vocab(&["vanilla", "oak"]);
    let text = "vanilla up front, then oak, then vanilla again much later on";
    let got = extractor(&v).extract_assignments(Some(text), Section::Palate);
    let vanilla: Vec<_> =
      got.iter().filter(|e| e.descriptor_id == id(&v, "vanilla")).collect();
    assert_eq!(vanilla.len(), 1);
    assert_eq!(vanilla[0].confidence, 0.9);
    assert!(got.iter().all(|e| e.method == ExtractionMethod::ProseConservative));
  }

  #[test]
  fn absent_sections_yield_nothing() {
    let v = vocab(&["oak"]);
    let e = extractor(&v);
    assert!(e.extract_assignments(None, Section::Finish).is_empty());
    assert!(e.extract_assignments(Some(""), Section::Finish).is_empty());
  }

  #[test]
  fn confidence_needs_some_section_text() {
    let v = vocab(&["oak", "vanilla"]);
    let text = ReviewText {
      nose:   Some("Oak".into()),
      palate: Some("Vanilla | Oak".into()),
      finish: None,
    };
    let got = extractor(&v).extract_review(ReviewId(1), &text);
    assert_eq!(got.pipe_sections, 1);
    assert_eq!(got.prose_sections, 1);
    assert!(got.confidence.is_some());

    // Two pipe matches: 1.0 mean × 0.8 sparse penalty, above the threshold.
    let text = ReviewText { nose: Some("Vanilla | Oak".into()), ..Default::default() };
    let got = extractor(&v).extract_review(ReviewId(1), &text);
    assert_eq!(got.prose_sections, 0);
    assert!((got.confidence.unwrap() - 0.8).abs() < 1e-9);
    assert!(!got.needs_manual_review());

    let got = extractor(&v).extract_review(ReviewId(1), &ReviewText::default());
    assert_eq!(got.confidence, None);
    assert!(!got.needs_manual_review());
  }

  #[test]
  fn pipe_review_matching_nothing_is_flagged() {
    let v = vocab(&["oak"]);
    let text = ReviewText { nose: Some("Campfire | Leather".into()), ..Default::default() };
    let got = extractor(&v).extract_review(ReviewId(5), &text);
    assert!(got.assignments.is_empty());
    assert_eq!(got.pipe_sections, 1);
    assert_eq!(got.confidence, Some(0.0));
    assert!(got.needs_manual_review());
  }

  #[test]
  fn sparse_prose_review_is_flagged() {
    let v = vocab(&["smoke", "peat"]);
    let text = ReviewText {
      nose: Some("a long walk through the glen and only later smoke".into()),
      ..Default::default()
    };
    let got = extractor(&v).extract_review(ReviewId(7), &text);
    assert_eq!(got.assignments.len(), 1);
    assert_eq!(got.assignments[0].review_id, ReviewId(7));
    assert_eq!(got.assignments[0].section, Section::Nose);
    // 0.7 mean × 0.8 sparse penalty
    assert!(got.needs_manual_review());
  }

  #[test]
  fn review_with_nothing_found_scores_zero() {
    let v = vocab(&["smoke"]);
    let text = ReviewText { finish: Some("short and clean".into()), ..Default::default() };
    let got = extractor(&v).extract_review(ReviewId(3), &text);
    assert!(got.assignments.is_empty());
    assert_eq!(got.confidence, Some(0.0));
    assert!(got.needs_manual_review());
  }

  #[test]
  fn mixed_review_counts_pipe_confidence() {
    let v = vocab(&["oak", "vanilla", "honey", "pepper", "apple"]);
    let text = ReviewText {
      nose:   Some("Oak | Vanilla | Honey | Pepper".into()),
      palate: Some("apple".into()),
      finish: None,
    };
    let got = extractor(&v).extract_review(ReviewId(1), &text);
    assert_eq!(got.assignments.len(), 5);
    // (4 × 1.0 + 0.9) / 5, no sparse penalty
    assert!((got.confidence.unwrap() - 0.98).abs() < 1e-9);
    assert!(!got.needs_manual_review());
  }
}
