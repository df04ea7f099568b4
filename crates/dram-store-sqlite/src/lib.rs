//! SQLite backend for the dram tasting store.
//!
//! Every query goes through a [`tokio_rusqlite`] connection, which owns the
//! SQLite handle on its own thread.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{RUN_HISTORY, SqliteStore};
