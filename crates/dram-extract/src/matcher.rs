//! Matcher for author-segmented, pipe-delimited tasting notes.
//!
//! Input looks like `"Brown sugar | Nutmeg | Oak"`. Each phrase is matched
//! against the vocabulary with zero tolerance for cross-phrase
//! contamination:
//!
//!   phrase
//!     ├─ exact equality            → record, phrase done
//!     ├─ multi-word substring      → record, cut out every copy, keep going
//!     └─ single-word, \b-bounded   → record, phrase done
//!
//! Multi-word terms are tried first so "brown sugar" is never also counted
//! as bare "sugar", and word boundaries keep "nut" out of "nutmeg".

use std::collections::BTreeSet;

use dram_core::descriptor::{DescriptorId, Section, normalize_name};
use serde::{Deserialize, Serialize};

use crate::vocabulary::{Entry, Vocabulary};

/// Leading qualifiers removed from a phrase when
/// [`MatcherOptions::strip_modifier_prefixes`] is on.
const MODIFIER_PREFIXES: &[&str] = &[
  "hints of ",
  "hint of ",
  "touch of ",
  "dash of ",
  "dab of ",
  "light ",
  "heavy ",
  "faint ",
  "slight ",
  "strong ",
  "muted ",
];

/// Tuning knobs for [`PipeMatcher`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherOptions {
  /// Remove one leading intensity qualifier ("light oak" → "oak") before
  /// matching. Off by default: intensity is otherwise only scored on the
  /// prose path.
  #[serde(default)]
  pub strip_modifier_prefixes: bool,
}

pub struct PipeMatcher<'v> {
  vocabulary: &'v Vocabulary,
  /// Indices into the vocabulary: multi-word first, then longest first.
  order:      Vec<usize>,
  options:    MatcherOptions,
}

impl<'v> PipeMatcher<'v> {
  pub fn new(vocabulary: &'v Vocabulary, options: MatcherOptions) -> Self {
    let entries = vocabulary.entries();
    let mut order: Vec<usize> = (0..entries.len()).collect();
    // The vocabulary is already longest-first with deterministic ties; a
    // stable sort on the multi-word flag alone preserves that within groups.
    order.sort_by_key(|&i| !entries[i].term.is_multi_word());
    Self { vocabulary, order, options }
  }

  /// Match one section's text. Absent or blank text yields an empty set.
  pub fn match_section(
    &self,
    text: Option<&str>,
    section: Section,
  ) -> BTreeSet<DescriptorId> {
    let mut found = BTreeSet::new();
    let Some(text) = text else { return found };

    for raw in text.split('|') {
      let phrase = normalize_name(raw);
      if phrase.is_empty() {
        continue;
      }
      let phrase = if self.options.strip_modifier_prefixes {
        self.strip_modifier(&phrase, section).to_owned()
      } else {
        phrase
      };
      self.match_phrase(phrase, section, &mut found);
    }

    found
  }

  fn match_phrase(
    &self,
    mut working: String,
    section: Section,
    found: &mut BTreeSet<DescriptorId>,
  ) {
    let entries = self.vocabulary.entries();
    for &i in &self.order {
      let Entry { term, pattern } = &entries[i];
      if !term.applies_to(section) {
        continue;
      }

      if working == term.name {
        found.insert(term.descriptor_id);
        return;
      }

      if term.is_multi_word() {
        if working.contains(term.name.as_str()) {
          found.insert(term.descriptor_id);
          // Every occurrence goes, so no copy is left for a component word.
          working = normalize_name(&working.replace(term.name.as_str(), " "));
          if working.is_empty() {
            return;
          }
        }
        continue;
      }

      if pattern.is_match(&working) {
        found.insert(term.descriptor_id);
        return;
      }
    }
  }

  /// Drop one leading qualifier unless it is part of an eligible term that
  /// the phrase starts with ("heavy cream" stays whole).
  fn strip_modifier<'p>(&self, phrase: &'p str, section: Section) -> &'p str {
    for &prefix in MODIFIER_PREFIXES {
      let Some(rest) = phrase.strip_prefix(prefix) else { continue };
      let protected = self.vocabulary.eligible(section).any(|e| {
        e.term.name.starts_with(prefix) && phrase.starts_with(e.term.name.as_str())
      });
      if protected || rest.trim().is_empty() {
        return phrase;
      }
      return rest.trim_start();
    }
    phrase
  }
}
