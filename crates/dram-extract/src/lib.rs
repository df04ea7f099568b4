//! Descriptor extraction and aggregation for dram.
//!
//! Given the active vocabulary and raw review text, this crate decides which
//! descriptors each review mentions per section, scores them, and rolls the
//! results up per whiskey:
//!
//! ```text
//!   ReviewText ─ classify ─┬─ pipe-delimited ─ PipeMatcher ──┐
//!                          └─ prose ────────── ProseExtractor ┴─ assignments ─ aggregate
//! ```
//!
//! Everything here is synchronous and free of I/O. The store supplies the
//! inputs and persists the [`dram_core::rebuild::RebuildOutput`].

pub mod aggregate;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod prose;
pub mod rebuild;
pub mod vocabulary;

pub use aggregate::{Aggregation, aggregate};
pub use error::{Error, Result};
pub use extract::{Extractor, ReviewExtraction, TextShape, classify};
pub use matcher::{MatcherOptions, PipeMatcher};
pub use prose::{ProseExtractor, ProseMatch, review_confidence};
pub use rebuild::rebuild;
pub use vocabulary::Vocabulary;
