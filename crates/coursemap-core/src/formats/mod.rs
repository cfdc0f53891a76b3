//! # Formats
//!
//! Serialized forms of core state.

pub mod persistence;

pub use persistence::{progress_from_json, progress_to_json};
