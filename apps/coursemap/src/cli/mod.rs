//! # Coursemap CLI Module
//!
//! This module implements the CLI interface for Coursemap.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show department metrics
//! - `courses` - List courses with lock and progress state
//! - `show` - Show one course's prerequisites and dependents
//! - `complete` / `uncheck` - Change a course's completion
//! - `select-option` / `select-credit` - Choose elective option or credit value
//! - `simulate` - Preview grades that reach a target GPA
//! - `import` - Replace progress from a plain-text transcript
//! - `reset` - Clear the department's progress

mod commands;

use crate::config::{BackendKind, Config};
use crate::transcript::FormatChoice;
use clap::{Parser, Subcommand};
use coursemap_core::{
    CoursemapError, Gpa,
    primitives::{DEFAULT_SIMULATION_COUNT, DEFAULT_SIMULATION_TARGET},
};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Coursemap - curriculum progress tracker
///
/// Tracks completed courses against a department curriculum, locks courses
/// with unmet prerequisites and projects GPA.
#[derive(Parser, Debug)]
#[command(name = "coursemap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the config file (default: ./coursemap.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the progress database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Directory holding `<CODE>.json` curricula
    #[arg(long, global = true)]
    pub curricula: Option<PathBuf>,

    /// Department code
    #[arg(short = 'd', long, global = true)]
    pub department: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show department metrics
    Status,

    /// List courses with lock and progress state
    Courses {
        /// Only this term
        #[arg(short, long)]
        term: Option<u8>,
    },

    /// Show one course's prerequisites, dependents and clause status
    Show {
        /// Course id (spaces and case are ignored)
        id: String,
    },

    /// Mark a course completed with a grade
    Complete {
        id: String,

        /// Letter grade (AA, BA, BB, CB, CC, DC, DD, FF)
        grade: String,

        /// Elective option index to select
        #[arg(short, long)]
        option: Option<usize>,
    },

    /// Mark a course incomplete, cascading to dependents
    Uncheck { id: String },

    /// Choose (or clear, when omitted) an elective option
    SelectOption { id: String, index: Option<usize> },

    /// Choose a value of a variable-credit course
    SelectCredit { id: String, index: usize },

    /// Preview grades for upcoming courses that reach a target GPA
    Simulate {
        /// Target GPA (0.00 - 4.00)
        #[arg(short, long, default_value_t = Gpa::from_hundredths(DEFAULT_SIMULATION_TARGET))]
        target: Gpa,

        /// Number of upcoming courses to fill
        #[arg(short = 'n', long, default_value_t = DEFAULT_SIMULATION_COUNT, allow_negative_numbers = true)]
        count: i64,
    },

    /// Replace progress from a plain-text transcript
    Import {
        /// Transcript text file
        file: PathBuf,

        /// Transcript layout
        #[arg(short, long, value_enum, default_value_t = FormatChoice::Auto)]
        format: FormatChoice,
    },

    /// Clear the department's progress
    Reset,
}

impl Cli {
    /// Apply command-line overrides on top of file settings.
    #[must_use]
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(database) = &self.database {
            config.database.clone_from(database);
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(curricula) = &self.curricula {
            config.curricula_dir.clone_from(curricula);
        }
        if let Some(department) = &self.department {
            config.department = department.trim().to_uppercase();
        }
        config
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and loaded settings.
pub async fn execute(cli: Cli, config: Config) -> Result<(), CoursemapError> {
    let config = cli.apply_overrides(config);
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            cmd_server(&config, &host, port).await
        }
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Courses { term }) => cmd_courses(&config, json_mode, term),
        Some(Commands::Show { id }) => cmd_show(&config, json_mode, &id),
        Some(Commands::Complete { id, grade, option }) => {
            cmd_complete(&config, json_mode, &id, &grade, option)
        }
        Some(Commands::Uncheck { id }) => cmd_uncheck(&config, json_mode, &id),
        Some(Commands::SelectOption { id, index }) => {
            cmd_select_option(&config, json_mode, &id, index)
        }
        Some(Commands::SelectCredit { id, index }) => {
            cmd_select_credit(&config, json_mode, &id, index)
        }
        Some(Commands::Simulate { target, count }) => {
            cmd_simulate(&config, json_mode, target, count)
        }
        Some(Commands::Import { file, format }) => {
            cmd_import(&config, json_mode, &file, format).await
        }
        Some(Commands::Reset) => cmd_reset(&config, json_mode),
    }
}
