//! Core types and the storage trait for the dram tasting-note pipeline.
//!
//! No HTTP, database, or text-matching code lives here. Every other crate
//! depends on this one.

pub mod assignment;
pub mod descriptor;
pub mod error;
pub mod rebuild;
pub mod review;
pub mod store;

pub use error::{Error, Result};
