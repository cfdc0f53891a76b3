//! # Transcript Import
//!
//! Turns transcript text into `(course id, grade)` rows ([`parser`]) and
//! reconciles those rows against the curriculum's courses and elective
//! slots ([`matcher`]). Applying the resulting plan is the job of
//! [`crate::ProgressStore::apply_import`].

pub mod matcher;
pub mod parser;

pub use matcher::{ImportPlan, ImportSummary, SlotAssignment, match_transcript};
pub use parser::{TranscriptFormat, normalize_lookalikes, parse_transcript};

use crate::primitives::MAX_TRANSCRIPT_ROWS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One `(course id, grade)` pair read from a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRow {
    pub id: String,
    pub grade: String,
}

impl TranscriptRow {
    #[must_use]
    pub fn new(id: impl Into<String>, grade: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            grade: grade.into(),
        }
    }
}

/// Errors of the import pipeline. None of them change stored progress.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The transcript text could not be obtained.
    #[error("Transcript extraction failed: {0}")]
    Extraction(String),

    /// No row carried a standard grade.
    #[error("No importable grades found ({skipped} skipped, {rejected} rejected)")]
    NothingToImport { skipped: usize, rejected: usize },

    /// The transcript has more rows than one import accepts.
    #[error("Too many transcript rows: {0} (max {MAX_TRANSCRIPT_ROWS})")]
    TooManyRows(usize),
}
