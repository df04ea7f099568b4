//! The immutable, pre-compiled descriptor vocabulary.
//!
//! Built once per rebuild from the store's active descriptors and lent to the
//! matcher and the prose extractor. Entries are kept longest-first; both
//! matchers rely on that order so compound terms claim text before their
//! component words.

use std::collections::HashMap;

use dram_core::descriptor::{DescriptorId, DescriptorTerm, Section};
use regex::Regex;

use crate::{Error, Result};

/// A vocabulary term with its whole-word pattern.
pub(crate) struct Entry {
  pub term:    DescriptorTerm,
  pub pattern: Regex,
}

pub struct Vocabulary {
  /// Longest name first; ties by name, then id.
  entries: Vec<Entry>,
  by_id:   HashMap<DescriptorId, usize>,
}

impl Vocabulary {
  /// Build from the store's descriptor list. Inactive terms are dropped.
  ///
  /// Fails with [`Error::VocabularyUnavailable`] if nothing active remains.
  pub fn new(terms: impl IntoIterator<Item = DescriptorTerm>) -> Result<Self> {
    let mut terms: Vec<DescriptorTerm> =
      terms.into_iter().filter(|t| t.active).collect();
    if terms.is_empty() {
      return Err(Error::VocabularyUnavailable);
    }

    terms.sort_by(|a, b| {
      b.len_chars()
        .cmp(&a.len_chars())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.descriptor_id.cmp(&b.descriptor_id))
    });

    let mut entries = Vec::with_capacity(terms.len());
    for term in terms {
      if term.applicable_sections.is_empty() {
        return Err(dram_core::Error::EmptySections(term.descriptor_id).into());
      }
      let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&term.name)))?;
      entries.push(Entry { term, pattern });
    }

    let by_id = entries
      .iter()
      .enumerate()
      .map(|(i, e)| (e.term.descriptor_id, i))
      .collect();

    tracing::debug!(descriptors = entries.len(), "vocabulary loaded");
    Ok(Self { entries, by_id })
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn get(&self, id: DescriptorId) -> Option<&DescriptorTerm> {
    self.by_id.get(&id).map(|&i| &self.entries[i].term)
  }

  /// Terms in matching order (longest first).
  pub fn terms(&self) -> impl Iterator<Item = &DescriptorTerm> {
    self.entries.iter().map(|e| &e.term)
  }

  pub(crate) fn entries(&self) -> &[Entry] { &self.entries }

  /// Entries applicable to `section`, longest first.
  pub(crate) fn eligible(&self, section: Section) -> impl Iterator<Item = &Entry> {
    self
      .entries
      .iter()
      .filter(move |e| e.term.applies_to(section))
  }
}
