//! Error types for the dram extraction pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The store returned no active descriptors. Extracting against an empty
  /// vocabulary would silently report "no descriptors found".
  #[error("descriptor vocabulary is empty; refusing to extract")]
  VocabularyUnavailable,

  #[error("invalid match pattern: {0}")]
  Pattern(#[from] regex::Error),

  #[error("core error: {0}")]
  Core(#[from] dram_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
