//! # Transcript Sources
//!
//! The only suspension point of an import: obtaining transcript text.
//! Rows are parsed before the caller touches the store, so a failed
//! extraction leaves progress unchanged.

use clap::ValueEnum;
use coursemap_core::{ImportError, TranscriptFormat, TranscriptRow, parse_transcript};
use serde::Deserialize;
use std::future::Future;
use std::path::PathBuf;

/// Maximum transcript file size (5 MB).
const MAX_TRANSCRIPT_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Yields the plain text of one transcript.
pub trait TranscriptSource {
    fn extract(&self) -> impl Future<Output = Result<String, ImportError>> + Send;
}

/// A text file already converted from the transcript document.
#[derive(Debug, Clone)]
pub struct FileTranscriptSource {
    path: PathBuf,
}

impl FileTranscriptSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TranscriptSource for FileTranscriptSource {
    async fn extract(&self) -> Result<String, ImportError> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| {
            ImportError::Extraction(format!("Cannot read '{}': {}", self.path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(ImportError::Extraction(format!(
                "'{}' is not a regular file",
                self.path.display()
            )));
        }
        if metadata.len() > MAX_TRANSCRIPT_FILE_SIZE {
            return Err(ImportError::Extraction(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_TRANSCRIPT_FILE_SIZE
            )));
        }
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ImportError::Extraction(e.to_string()))
    }
}

/// Text received in memory, e.g. an HTTP request body.
#[derive(Debug, Clone)]
pub struct TextTranscriptSource(pub String);

impl TranscriptSource for TextTranscriptSource {
    async fn extract(&self) -> Result<String, ImportError> {
        if self.0.trim().is_empty() {
            return Err(ImportError::Extraction("Transcript text is empty".to_string()));
        }
        Ok(self.0.clone())
    }
}

// =============================================================================
// FORMAT SELECTION
// =============================================================================

/// Layout requested by the user; `Auto` sniffs the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatChoice {
    #[default]
    Auto,
    Edevlet,
    School,
}

impl FormatChoice {
    #[must_use]
    pub fn resolve(self, text: &str) -> TranscriptFormat {
        match self {
            Self::Auto => TranscriptFormat::detect(text),
            Self::Edevlet => TranscriptFormat::EDevlet,
            Self::School => TranscriptFormat::School,
        }
    }
}

/// Extract and parse one transcript.
pub async fn read_rows<S: TranscriptSource>(
    source: &S,
    choice: FormatChoice,
) -> Result<(TranscriptFormat, Vec<TranscriptRow>), ImportError> {
    let text = source.extract().await?;
    let format = choice.resolve(&text);
    Ok((format, parse_transcript(&text, format)))
}
