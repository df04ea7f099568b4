//! Error types for `dram-core`.

use thiserror::Error;

use crate::descriptor::DescriptorId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("descriptor {0} has no applicable sections")]
  EmptySections(DescriptorId),

  #[error("descriptor name must not be empty")]
  EmptyDescriptorName,

  #[error("unknown tasting section: {0:?}")]
  UnknownSection(String),

  #[error("unknown extraction method: {0:?}")]
  UnknownMethod(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
