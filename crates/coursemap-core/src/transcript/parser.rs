//! Plain-text transcript row extraction.
//!
//! Text pulled out of a transcript PDF is unstructured: lines are often
//! joined and Greek capitals stand in for Latin ones. Rows are recovered by
//! scanning for a course code followed, on the same line, by the first
//! letter grade.

use super::TranscriptRow;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Layout family of a transcript document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptFormat {
    /// Government-issued transcript (carries a `YOKTR` barcode).
    EDevlet,
    /// School information system printout.
    School,
}

impl TranscriptFormat {
    /// Guess the layout from the document text.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.contains("YOKTR") || text.contains("e-Devlet") {
            Self::EDevlet
        } else {
            Self::School
        }
    }
}

// Codes may be padded with runs of spaces or tabs ("PHYS   101").
fn transcript_row() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"\b([A-Z]{2,4}[ \t]*\d{3})\b.*?\b(AA|BA|BB|CB|CC|DC|DD|FD|FF)\b")
            .expect("transcript row regex is valid")
    })
}

/// Replace Greek capitals that look like Latin ones.
#[must_use]
pub fn normalize_lookalikes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'Μ' => 'M',
            'Ε' => 'E',
            'Β' => 'B',
            'Ι' => 'I',
            'Ο' => 'O',
            'Α' => 'A',
            'Τ' => 'T',
            'Η' => 'H',
            'Κ' => 'K',
            'Ρ' => 'P',
            'Χ' => 'X',
            'Υ' => 'Y',
            'Ζ' => 'Z',
            other => other,
        })
        .collect()
}

/// Extract every `(course id, grade)` row from transcript text.
///
/// Ids are returned with inner whitespace collapsed to one space
/// (`"PHYS 101"`). `FD` is extracted here and rejected by the matcher.
/// Both layouts share one row pattern; `format` is only logged.
#[must_use]
pub fn parse_transcript(text: &str, format: TranscriptFormat) -> Vec<TranscriptRow> {
    let normalized = normalize_lookalikes(text);

    let rows: Vec<TranscriptRow> = transcript_row()
        .captures_iter(&normalized)
        .map(|caps| {
            let id = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
            TranscriptRow::new(id, &caps[2])
        })
        .collect();

    tracing::debug!(?format, rows = rows.len(), "Parsed transcript text");
    rows
}
