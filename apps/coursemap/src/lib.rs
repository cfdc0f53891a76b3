//! # Coursemap Application
//!
//! The async shell around `coursemap-core`: configuration, the CLI, the
//! HTTP API and the transcript text sources. The binary in `main.rs` only
//! initializes logging and dispatches to [`cli::execute`].

pub mod actions;
pub mod api;
pub mod cli;
pub mod config;
pub mod events;
pub mod transcript;
