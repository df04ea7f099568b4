//! Descriptor terms, the controlled sensory vocabulary.
//!
//! A descriptor is a canonical term such as "vanilla" or "brown sugar",
//! scoped to the tasting sections in which it may legitimately appear.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Stable identifier of a [`DescriptorTerm`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DescriptorId(pub i64);

impl fmt::Display for DescriptorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Section ─────────────────────────────────────────────────────────────────

/// One of the three phases of a tasting note.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Section {
  Nose,
  Palate,
  Finish,
}

impl Section {
  /// All sections in tasting order.
  pub const ALL: [Section; 3] = [Section::Nose, Section::Palate, Section::Finish];

  /// The lowercase name stored in the `tasting_section` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Nose => "nose",
      Self::Palate => "palate",
      Self::Finish => "finish",
    }
  }
}

impl fmt::Display for Section {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Section {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "nose" => Ok(Self::Nose),
      "palate" => Ok(Self::Palate),
      "finish" => Ok(Self::Finish),
      _ => Err(Error::UnknownSection(s.to_owned())),
    }
  }
}

// ─── DescriptorTerm ──────────────────────────────────────────────────────────

/// A canonical sensory term from the vocabulary.
///
/// Immutable once created except for deactivation. The name is always stored
/// lowercase and trimmed; see [`normalize_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorTerm {
  pub descriptor_id:       DescriptorId,
  pub name:                String,
  /// Never empty.
  pub applicable_sections: BTreeSet<Section>,
  pub active:              bool,
}

impl DescriptorTerm {
  /// Build an active term, normalising the name and checking the section set.
  pub fn new(
    descriptor_id: DescriptorId,
    name: &str,
    applicable_sections: impl IntoIterator<Item = Section>,
  ) -> Result<Self> {
    let name = normalize_name(name);
    if name.is_empty() {
      return Err(Error::EmptyDescriptorName);
    }
    let applicable_sections: BTreeSet<Section> =
      applicable_sections.into_iter().collect();
    if applicable_sections.is_empty() {
      return Err(Error::EmptySections(descriptor_id));
    }
    Ok(Self { descriptor_id, name, applicable_sections, active: true })
  }

  pub fn applies_to(&self, section: Section) -> bool {
    self.applicable_sections.contains(&section)
  }

  /// Whether the term has more than one word ("brown sugar", "stone fruit").
  pub fn is_multi_word(&self) -> bool { self.name.contains(char::is_whitespace) }

  /// Term length in characters; the vocabulary is ordered on this.
  pub fn len_chars(&self) -> usize { self.name.chars().count() }
}

/// Lowercase, trim, and collapse inner whitespace.
pub fn normalize_name(name: &str) -> String {
  name
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}
