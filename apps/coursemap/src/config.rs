//! # Configuration
//!
//! Settings read from `coursemap.toml`. Every key is optional; CLI flags
//! override whatever the file provides.
//!
//! ```toml
//! database = "coursemap.db"
//! backend = "redb"
//! curricula_dir = "curricula"
//! department = "ME"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [log]
//! format = "json"
//! ```

use clap::ValueEnum;
use coursemap_core::{
    CoursemapError, Curriculum, MemoryStore, ProgressStore, RedbStore, StorageBackend,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "coursemap.toml";

/// Largest curriculum document accepted from disk (1 MB).
const MAX_CURRICULUM_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// CONFIG TYPES
// =============================================================================

/// Where progress is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ACID database file.
    #[default]
    Redb,
    /// Process memory; nothing survives exit.
    Memory,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redb => f.write_str("redb"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read `COURSEMAP_LOG_FORMAT`, if set to a known value.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        match std::env::var("COURSEMAP_LOG_FORMAT").ok()?.as_str() {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub format: LogFormat,
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Progress database path (redb backend only).
    pub database: PathBuf,
    pub backend: BackendKind,
    /// Directory holding one `<CODE>.json` curriculum per department.
    pub curricula_dir: PathBuf,
    /// Department code activated at startup.
    pub department: String,
    pub server: ServerConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("coursemap.db"),
            backend: BackendKind::default(),
            curricula_dir: PathBuf::from("curricula"),
            department: "ME".to_string(),
            server: ServerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, CoursemapError> {
        toml::from_str(text).map_err(|e| CoursemapError::DeserializationError(e.to_string()))
    }

    /// Load settings from `path`, or from [`DEFAULT_CONFIG_FILE`] when no
    /// path is given.
    ///
    /// A missing default file yields defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, CoursemapError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CoursemapError::IoError(format!(
                "Cannot read config '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// Path of the curriculum document for `department`.
    #[must_use]
    pub fn curriculum_path(&self, department: &str) -> PathBuf {
        self.curricula_dir
            .join(format!("{}.json", department.trim().to_uppercase()))
    }

    /// Read and validate the curriculum of `department`.
    pub fn load_curriculum(&self, department: &str) -> Result<Curriculum, CoursemapError> {
        let path = self.curriculum_path(department);
        let metadata = std::fs::metadata(&path).map_err(|e| {
            CoursemapError::IoError(format!("Cannot read curriculum '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CURRICULUM_FILE_SIZE {
            return Err(CoursemapError::DeserializationError(format!(
                "Curriculum file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CURRICULUM_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|e| CoursemapError::IoError(format!("Failed to read curriculum: {}", e)))?;
        Curriculum::from_json(&text)
    }

    /// Build the storage backend this config names.
    pub fn open_backend(&self) -> Result<StorageBackend, CoursemapError> {
        match self.backend {
            BackendKind::Redb => Ok(StorageBackend::Persistent(RedbStore::open(&self.database)?)),
            BackendKind::Memory => Ok(StorageBackend::InMemory(MemoryStore::new())),
        }
    }

    /// Open the configured department's progress store.
    pub fn open_store(&self) -> Result<ProgressStore, CoursemapError> {
        let curriculum = self.load_curriculum(&self.department)?;
        Ok(ProgressStore::open(curriculum, self.open_backend()?))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const ME_CURRICULUM: &str = include_str!("../../../curricula/ME.json");

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = Config::from_toml(
            r#"
            backend = "memory"
            department = "CE"

            [server]
            port = 9090

            [log]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.department, "CE");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.database, PathBuf::from("coursemap.db"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("colour = \"blue\"").is_err());
        assert!(Config::from_toml("backend = \"sqlite\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(CoursemapError::IoError(_))
        ));
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coursemap.toml");
        std::fs::write(&path, "department = \"EE\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.department, "EE");
    }

    #[test]
    fn curriculum_path_uses_upper_case_code() {
        let config = Config {
            curricula_dir: PathBuf::from("data"),
            ..Config::default()
        };
        assert_eq!(config.curriculum_path(" me "), PathBuf::from("data/ME.json"));
    }

    #[test]
    fn open_store_with_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ME.json"), ME_CURRICULUM).unwrap();
        let config = Config {
            backend: BackendKind::Memory,
            curricula_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let store = config.open_store().unwrap();
        assert_eq!(store.department(), "ME");
        assert!(store.progress().is_empty());
        assert!(!store.backend().is_persistent());
    }

    #[test]
    fn missing_curriculum_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            backend: BackendKind::Memory,
            curricula_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        assert!(matches!(config.open_store(), Err(CoursemapError::IoError(_))));
    }
}
