//! # Coursemap - Curriculum Progress Tracker
//!
//! The main binary for Coursemap.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for progress operations
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  apps/coursemap (THE BINARY)              │
//! │                                                           │
//! │   ┌─────────────┐   ┌─────────────┐   ┌──────────────┐    │
//! │   │    CLI      │   │  HTTP API   │   │  Transcript  │    │
//! │   │   (clap)    │   │   (axum)    │   │   sources    │    │
//! │   └──────┬──────┘   └──────┬──────┘   └──────┬───────┘    │
//! │          └─────────────────┼─────────────────┘            │
//! │                            ▼                              │
//! │                   ┌────────────────┐                      │
//! │                   │ coursemap-core │                      │
//! │                   │  (THE LOGIC)   │                      │
//! │                   └────────────────┘                      │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! coursemap server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! coursemap status
//! coursemap complete MATH101 AA
//! coursemap simulate --target 3.25 --count 4
//! ```

use clap::Parser;
use coursemap::cli;
use coursemap::config::{Config, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    let config = Config::load(cli.config.as_deref());

    // COURSEMAP_LOG_FORMAT wins over the config file.
    let log_format = LogFormat::from_env()
        .or_else(|| config.as_ref().ok().map(|c| c.log.format))
        .unwrap_or_default();
    init_tracing(log_format, cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    let result = match config {
        Ok(config) => cli::execute(cli, config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so `--json-mode` output stays parseable.
fn init_tracing(format: LogFormat, verbose: bool) {
    let default_filter = if verbose {
        "coursemap=debug,tower_http=debug"
    } else {
        "coursemap=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the Coursemap startup banner.
fn print_banner() {
    println!(
        r#"
   ___  ___   _   _  ___  ___  ___  __  __    _    ___
  / __|/ _ \ | | | || _ \/ __|| __||  \/  |  /_\  | _ \
 | (__| (_) || |_| ||   /\__ \| _| | |\/| | / _ \ |  _/
  \___|\___/  \___/ |_|_\|___/|___||_|  |_|/_/ \_\|_|

  Curriculum Progress Tracker v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
