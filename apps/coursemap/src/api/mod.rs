//! # Coursemap HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Department metrics and change revision
//! - `GET /courses` - Every course with lock and progress state
//! - `GET /courses/{id}` - One course with clause status and related courses
//! - `POST /progress` - Complete or uncheck a course
//! - `POST /progress/option` - Choose an elective option
//! - `POST /progress/credit` - Choose a variable credit value
//! - `POST /reset` - Clear progress
//! - `POST /simulation/enter` - Enter simulation mode
//! - `POST /simulation/exit` - Discard simulated changes
//! - `POST /simulation/run` - Simulate grades toward a target GPA
//! - `POST /transcript` - Import a plain-text transcript
//!
//! ## Configuration (Environment Variables)
//!
//! - `COURSEMAP_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

pub use handlers::{
    course_handler, courses_handler, credit_handler, health_handler, option_handler,
    progress_handler, reset_handler, simulation_enter_handler, simulation_exit_handler,
    simulation_run_handler, status_handler, transcript_handler,
};
pub use types::{
    CourseDetailResponse, CourseView, CoursesResponse, CreditRequest, ErrorResponse,
    HealthResponse, ImportResponse, ModeResponse, OptionRequest, ProgressRequest,
    ProgressResponse, SimulationResponse, SimulationRunRequest, StatusResponse, TranscriptQuery,
};

use crate::events::{LogObserver, RevisionCounter};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use coursemap_core::{CoursemapError, ProgressStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the progress store.
#[derive(Clone)]
pub struct AppState {
    /// The active department's progress.
    pub store: Arc<RwLock<ProgressStore>>,
    /// Bumped by the store on every change.
    pub revision: Arc<RevisionCounter>,
}

impl AppState {
    /// Create app state, subscribing the revision counter and the log
    /// observer to the store.
    #[must_use]
    pub fn new(mut store: ProgressStore) -> Self {
        let revision = Arc::new(RevisionCounter::new());
        store.subscribe(revision.clone());
        store.subscribe(Arc::new(LogObserver));
        Self {
            store: Arc::new(RwLock::new(store)),
            revision,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `COURSEMAP_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("COURSEMAP_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (COURSEMAP_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in COURSEMAP_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::debug!("CORS: No COURSEMAP_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/courses", get(handlers::courses_handler))
        .route("/courses/{id}", get(handlers::course_handler))
        .route("/progress", post(handlers::progress_handler))
        .route("/progress/option", post(handlers::option_handler))
        .route("/progress/credit", post(handlers::credit_handler))
        .route("/reset", post(handlers::reset_handler))
        .route("/simulation/enter", post(handlers::simulation_enter_handler))
        .route("/simulation/exit", post(handlers::simulation_exit_handler))
        .route("/simulation/run", post(handlers::simulation_run_handler))
        .route("/transcript", post(handlers::transcript_handler))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, store: ProgressStore) -> Result<(), CoursemapError> {
    let router = create_router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CoursemapError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Coursemap HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoursemapError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
