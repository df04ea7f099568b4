//! Error type for `dram-store-sqlite`.

use dram_core::review::WhiskeyId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dram_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("descriptor {0:?} already exists")]
  DuplicateDescriptor(String),

  /// A review was added for a whiskey that does not exist.
  #[error("whiskey not found: {0}")]
  WhiskeyNotFound(WhiskeyId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
