//! Conservative descriptor extraction from free-form prose.
//!
//! Precision over recall: every whole-word occurrence of a vocabulary term is
//! a candidate, negated candidates are dropped, and the rest are scored.
//! Anything under [`CONFIDENCE_FLOOR`] never leaves this module.
//!
//! Scores are kept in tenths internally so threshold comparisons are exact.

use dram_core::descriptor::{DescriptorId, Section};
use regex::Regex;

use crate::{Result, vocabulary::Vocabulary};

/// Candidates scoring below this are discarded.
pub const CONFIDENCE_FLOOR: f64 = 0.6;

/// Reviews whose aggregate confidence is below this need a human look.
pub const MANUAL_REVIEW_THRESHOLD: f64 = 0.7;

/// Fewer retained descriptors than this triggers the sparsity penalty.
pub const SPARSE_DESCRIPTOR_COUNT: usize = 5;

const SPARSE_PENALTY: f64 = 0.8;

const BASE_TENTHS: u8 = 7;
const FLOOR_TENTHS: u8 = 6;
const MAX_TENTHS: u8 = 10;

/// Tokens inspected before a match when looking for negation.
const NEGATION_WINDOW: usize = 5;

/// Characters inspected on each side of a match for intensity words.
const INTENSITY_WINDOW: usize = 50;

const CLAUSE_BOUNDARIES: [char; 4] = [',', ';', '.', ':'];

const NEGATION_WORDS: &[&str] = &[
  "not", "no", "without", "lacking", "lacks", "absent", "missing", "devoid",
  "never", "hardly",
];

const REVERSAL_WORDS: &[&str] = &["but", "however", "yet", "though", "although"];

const WEAK_INTENSITY: &[&str] = &[
  "hint", "hints", "trace", "traces", "subtle", "mild", "faint", "slight",
  "touch", "dab", "dash", "bit of",
];

const STRONG_INTENSITY: &[&str] = &[
  "dominant", "prominent", "heavy", "rich", "bold", "strong", "intense",
  "powerful", "ample", "plentiful",
];

/// One accepted occurrence of a descriptor in normalised section text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProseMatch {
  pub descriptor_id: DescriptorId,
  pub confidence:    f64,
  /// Byte span in the normalised text.
  pub start:         usize,
  pub end:           usize,
}

pub struct ProseExtractor<'v> {
  vocabulary: &'v Vocabulary,
  weak:       Regex,
  strong:     Regex,
}

impl<'v> ProseExtractor<'v> {
  pub fn new(vocabulary: &'v Vocabulary) -> Result<Self> {
    Ok(Self {
      vocabulary,
      weak: word_alternation(WEAK_INTENSITY)?,
      strong: word_alternation(STRONG_INTENSITY)?,
    })
  }

  /// Extract descriptors from one section of prose, ordered by position.
  ///
  /// Absent or blank text yields nothing; this never fails on input text.
  pub fn extract_section(&self, text: Option<&str>, section: Section) -> Vec<ProseMatch> {
    let text = normalize_text(text.unwrap_or_default());
    if text.is_empty() {
      return Vec::new();
    }
    let total_chars = text.chars().count();
    let intensity = Intensity {
      weak:   spans(&self.weak, &text),
      strong: spans(&self.strong, &text),
    };

    let mut accepted: Vec<ProseMatch> = Vec::new();
    for entry in self.vocabulary.eligible(section) {
      for m in entry.pattern.find_iter(&text) {
        let (start, end) = (m.start(), m.end());
        if accepted.iter().any(|a| a.start < end && start < a.end) {
          continue;
        }
        if is_negated(&text, start) {
          continue;
        }
        let tenths = score_tenths(&text, start, end, total_chars, &intensity);
        if tenths < FLOOR_TENTHS {
          continue;
        }
        accepted.push(ProseMatch {
          descriptor_id: entry.term.descriptor_id,
          confidence: f64::from(tenths) / 10.0,
          start,
          end,
        });
      }
    }

    accepted.sort_by_key(|m| m.start);
    accepted
  }
}

/// Whole-word intensity hits over the full normalised text, as byte spans.
struct Intensity {
  weak:   Vec<(usize, usize)>,
  strong: Vec<(usize, usize)>,
}

fn spans(pattern: &Regex, text: &str) -> Vec<(usize, usize)> {
  pattern.find_iter(text).map(|m| (m.start(), m.end())).collect()
}

/// Whether any hit lies entirely inside one of the windows.
fn any_within(hits: &[(usize, usize)], windows: [(usize, usize); 2]) -> bool {
  hits
    .iter()
    .any(|&(s, e)| windows.iter().any(|&(lo, hi)| lo <= s && e <= hi))
}

fn score_tenths(
  text: &str,
  start: usize,
  end: usize,
  total_chars: usize,
  intensity: &Intensity,
) -> u8 {
  let mut tenths = BASE_TENTHS;

  let position = text[..start].chars().count() as f64 / total_chars as f64;
  if position < 0.2 {
    tenths += 2;
  } else if position < 0.5 {
    tenths += 1;
  }

  // Hits come from the whole text; a word cut by a window edge never counts.
  let windows = [
    (back_chars(text, start, INTENSITY_WINDOW), start),
    (end, forward_chars(text, end, INTENSITY_WINDOW)),
  ];
  if any_within(&intensity.weak, windows) {
    tenths -= 2;
  }
  if any_within(&intensity.strong, windows) {
    tenths += 2;
  }

  tenths.min(MAX_TENTHS)
}

/// Aggregate confidence for a whole review from its retained per-descriptor
/// confidences: the mean, scaled by [`SPARSE_PENALTY`] when fewer than
/// [`SPARSE_DESCRIPTOR_COUNT`] were retained, and `0.0` when none were.
pub fn review_confidence(confidences: &[f64]) -> f64 {
  if confidences.is_empty() {
    return 0.0;
  }
  let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
  if confidences.len() < SPARSE_DESCRIPTOR_COUNT {
    mean * SPARSE_PENALTY
  } else {
    mean
  }
}

pub fn needs_manual_review(confidence: f64) -> bool {
  confidence < MANUAL_REVIEW_THRESHOLD
}

/// Lowercase, unify apostrophes, and collapse whitespace.
pub fn normalize_text(text: &str) -> String {
  text
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .replace(['\u{2019}', '\u{2018}'], "'")
    .to_lowercase()
}

/// Whether the match starting at `start` is negated within its clause.
///
/// "not sweet" is negated; "not sweet but rich" is not, for "rich", because
/// a reversal word sits between the negation and the match.
fn is_negated(text: &str, start: usize) -> bool {
  let before = &text[..start];
  let clause_start = before.rfind(CLAUSE_BOUNDARIES).map_or(0, |i| i + 1);

  let tokens: Vec<&str> = before[clause_start..]
    .split_whitespace()
    .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
    .filter(|t| !t.is_empty())
    .collect();
  let window = &tokens[tokens.len().saturating_sub(NEGATION_WINDOW)..];

  let Some(neg) = window.iter().rposition(|t| is_negation(t)) else {
    return false;
  };
  !window[neg + 1..].iter().any(|t| REVERSAL_WORDS.contains(t))
}

fn is_negation(token: &str) -> bool {
  NEGATION_WORDS.contains(&token) || token.ends_with("n't")
}

fn word_alternation(words: &[&str]) -> Result<Regex> {
  let alternation = words
    .iter()
    .map(|w| regex::escape(w))
    .collect::<Vec<_>>()
    .join("|");
  Ok(Regex::new(&format!(r"\b(?:{alternation})\b"))?)
}

/// Byte offset `n` characters before `from` (clamped to 0).
fn back_chars(text: &str, from: usize, n: usize) -> usize {
  text[..from]
    .char_indices()
    .rev()
    .nth(n.saturating_sub(1))
    .map_or(0, |(i, _)| i)
}

/// Byte offset `n` characters after `from` (clamped to the end).
fn forward_chars(text: &str, from: usize, n: usize) -> usize {
  text[from..]
    .char_indices()
    .nth(n)
    .map_or(text.len(), |(i, _)| from + i)
}

#[cfg(test)]
mod tests {
  use dram_core::descriptor::DescriptorTerm;

  use super::*;
  use crate::vocabulary::tests::{id, vocab};

  fn extract(v: &Vocabulary, text: &str) -> Vec<ProseMatch> {
    ProseExtractor::new(v)
      .unwrap()
      .extract_section(Some(text), Section::Palate)
  }

  fn confidence_of(v: &Vocabulary, text: &str, name: &str) -> Option<f64> {
    let target = id(v, name);
    extract(v, text)
      .into_iter()
      .find(|m| m.descriptor_id == target)
      .map(|m| m.confidence)
  }

  fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

  // ── Negation ────────────────────────────────────────────────────────────

  #[test]
  fn simple_negation_rejects() {
    let v = vocab(&["sweet", "oak"]);
    assert!(confidence_of(&v, "not sweet", "sweet").is_none());
    assert!(confidence_of(&v, "there is no oak here", "oak").is_none());
  }

  #[test]
  fn clause_boundary_resets_negation() {
    let v = vocab(&["sweet", "rich", "bold"]);
    let text = "not sweet, but rich and bold";
    assert!(confidence_of(&v, text, "sweet").is_none());
    assert!(confidence_of(&v, text, "rich").is_some());
    assert!(confidence_of(&v, text, "bold").is_some());
  }

  #[test]
  fn reversal_word_overrides_negation() {
    let v = vocab(&["sweet", "rich"]);
    assert!(confidence_of(&v, "not sweet but rich", "rich").is_some());
    assert!(confidence_of(&v, "not rich", "rich").is_none());
  }

  #[test]
  fn negation_beyond_five_tokens_is_ignored() {
    let v = vocab(&["vanilla"]);
    let text = "not what one expects from the barrel vanilla";
    assert!(confidence_of(&v, text, "vanilla").is_some());
  }

  #[test]
  fn contracted_negation_rejects() {
    let v = vocab(&["smoke"]);
    assert!(confidence_of(&v, "it doesn't show smoke", "smoke").is_none());
    assert!(confidence_of(&v, "it isn\u{2019}t smoke", "smoke").is_none());
  }

  #[test]
  fn negation_carries_across_a_list_within_a_clause() {
    let v = vocab(&["caramel", "vanilla"]);
    assert!(confidence_of(&v, "no caramel or vanilla", "vanilla").is_none());
  }

  // ── Overlap and boundaries ──────────────────────────────────────────────

  #[test]
  fn compound_term_suppresses_its_component() {
    let v = vocab(&["brown sugar", "sugar"]);
    let got = extract(&v, "brown sugar up front with oak");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].descriptor_id, id(&v, "brown sugar"));
  }

  #[test]
  fn component_elsewhere_still_matches() {
    let v = vocab(&["brown sugar", "sugar"]);
    let got = extract(&v, "brown sugar then sugar");
    assert_eq!(got.len(), 2);
  }

  #[test]
  fn nut_never_matches_nutmeg() {
    let v = vocab(&["nut", "nutmeg"]);
    let got = extract(&v, "warm nutmeg and baking spice");
    assert!(got.iter().all(|m| m.descriptor_id != id(&v, "nut")));
  }

  #[test]
  fn results_are_unique_by_span_and_ordered() {
    let v = vocab(&["oak", "vanilla"]);
    let got = extract(&v, "vanilla, oak, more vanilla");
    let starts: Vec<usize> = got.iter().map(|m| m.start).collect();
    assert_eq!(starts, [0, 9, 19]);
  }

  // ── Confidence ──────────────────────────────────────────────────────────

  #[test]
  fn early_match_gets_full_position_bonus() {
    let v = vocab(&["sweet"]);
    let c = confidence_of(&v, "sweet", "sweet").unwrap();
    assert!(close(c, 0.9));
  }

  #[test]
  fn middle_and_late_position_bonuses() {
    let v = vocab(&["vanilla"]);
    // offset 30 of 60 chars → 50% → no bonus
    let late = "a".repeat(29) + " vanilla" + &" z".repeat(11) + " ";
    assert!(close(confidence_of(&v, late.trim_end(), "vanilla").unwrap(), 0.7));
    // offset 12 of 40 chars → 30% → +0.1
    let mid = "a".repeat(11) + " vanilla " + &"b".repeat(20);
    assert!(close(confidence_of(&v, &mid, "vanilla").unwrap(), 0.8));
  }

  #[test]
  fn weak_intensity_lowers_confidence() {
    let v = vocab(&["sweet"]);
    let plain = "sweet grain with oak spice and a long dry finish overall";
    let hinted = "hint of sweet grain with oak spice and a long dry finish";
    let base = confidence_of(&v, plain, "sweet").unwrap();
    let weak = confidence_of(&v, hinted, "sweet").unwrap();
    assert!(weak < base, "{weak} !< {base}");
    assert!(close(weak, 0.7));
  }

  #[test]
  fn strong_intensity_raises_confidence_capped() {
    let v = vocab(&["caramel"]);
    let text = "plenty of grain and more grain here and then bold caramel";
    let c = confidence_of(&v, text, "caramel").unwrap();
    assert!(close(c, 0.9));
    let early = confidence_of(&v, "rich caramel", "caramel").unwrap();
    assert!(close(early, 1.0));
  }

  #[test]
  fn intensity_word_cut_by_window_edge_does_not_count() {
    let v = vocab(&["oak"]);
    // "bold" ends exactly 50 characters after "oak"; "boldness" runs past.
    let filler = "x".repeat(44);
    let whole = format!("oak {filler} bold");
    let longer = format!("oak {filler} boldness");
    assert_eq!(confidence_of(&v, &whole, "oak"), Some(1.0));
    assert_eq!(confidence_of(&v, &longer, "oak"), Some(0.9));
  }

  #[test]
  fn weak_word_prefix_at_window_edge_keeps_late_match() {
    let v = vocab(&["smoke"]);
    // "touching" straddles the forward window; only "touch" would fit.
    let text = format!("{} smoke {} touching", "q".repeat(60), "y".repeat(43));
    assert_eq!(confidence_of(&v, &text, "smoke"), Some(0.7));

    let text = format!("{} smoke {} touch", "q".repeat(60), "y".repeat(43));
    assert!(confidence_of(&v, &text, "smoke").is_none());
  }

  #[test]
  fn late_weak_match_is_discarded() {
    let v = vocab(&["smoke"]);
    let text = "lots of fruit and grain up front, with the faintest smoke and a faint smoke";
    assert!(confidence_of(&v, text, "smoke").is_none());
  }

  #[test]
  fn nothing_below_floor_is_returned() {
    let v = vocab(&["oak", "smoke", "honey", "pepper"]);
    let text = "honey early on; then much later a hint of oak, a trace of smoke, \
                slight pepper and a mild bit of oak at the very end of it all";
    for m in extract(&v, text) {
      assert!(m.confidence >= CONFIDENCE_FLOOR, "{m:?}");
    }
  }

  #[test]
  fn mid_position_weak_match_sits_exactly_on_floor() {
    let v = vocab(&["honey"]);
    // offset 12 of 40 chars → +0.1, weak −0.2 → 0.6, kept.
    let text = "a hint of b honey ".to_string() + &"c".repeat(22);
    let c = confidence_of(&v, &text, "honey").unwrap();
    assert!(close(c, 0.6));
  }

  #[test]
  fn section_scopes_candidates() {
    let v = Vocabulary::new([
      DescriptorTerm::new(DescriptorId(1), "smoke", [Section::Nose]).unwrap(),
    ])
    .unwrap();
    let p = ProseExtractor::new(&v).unwrap();
    assert_eq!(p.extract_section(Some("smoke"), Section::Nose).len(), 1);
    assert!(p.extract_section(Some("smoke"), Section::Finish).is_empty());
  }

  #[test]
  fn absent_text_yields_nothing() {
    let v = vocab(&["oak"]);
    let p = ProseExtractor::new(&v).unwrap();
    assert!(p.extract_section(None, Section::Nose).is_empty());
    assert!(p.extract_section(Some("   "), Section::Nose).is_empty());
  }

  // ── Review confidence ───────────────────────────────────────────────────

  #[test]
  fn review_confidence_empty_is_zero() {
    assert_eq!(review_confidence(&[]), 0.0);
    assert!(needs_manual_review(0.0));
  }

  #[test]
  fn review_confidence_sparse_penalty() {
    let c = review_confidence(&[0.9, 0.9]);
    assert!(close(c, 0.72));
    assert!(!needs_manual_review(c));

    let c = review_confidence(&[0.8, 0.8, 0.8]);
    assert!(close(c, 0.64));
    assert!(needs_manual_review(c));
  }

  #[test]
  fn review_confidence_full_mean() {
    let c = review_confidence(&[0.7, 0.9, 0.8, 1.0, 0.6]);
    assert!(close(c, 0.8));
  }
}
