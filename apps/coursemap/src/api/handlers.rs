//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        CourseDetailResponse, CourseView, CoursesResponse, CreditRequest, ErrorResponse,
        HealthResponse, ImportResponse, ModeResponse, OptionRequest, ProgressRequest,
        ProgressResponse, SimulationResponse, SimulationRunRequest, StatusResponse,
        TranscriptQuery,
    },
};
use crate::actions;
use crate::transcript::{TextTranscriptSource, read_rows};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use coursemap_core::{
    CourseId, CoursemapError, ImportError, ProgressStore, SimulationError, SimulationRequest,
    clause_status, related_courses,
};

/// Build the view of a course known to exist.
fn view(store: &ProgressStore, id: &CourseId) -> Option<CourseView> {
    store
        .curriculum()
        .get(id.as_str())
        .map(|course| CourseView::new(course, store))
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get department status and metrics.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    let response = StatusResponse::new(&store, state.revision.current());
    (StatusCode::OK, Json(response))
}

// =============================================================================
// COURSE HANDLERS
// =============================================================================

/// List every course with its lock and progress state.
pub async fn courses_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    let courses = store
        .curriculum()
        .courses()
        .iter()
        .map(|course| CourseView::new(course, &store))
        .collect();

    Json(CoursesResponse {
        department: store.department().to_string(),
        courses,
    })
}

/// One course with its clause status and related courses.
pub async fn course_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let store = state.store.read().await;
    let Ok(course_id) = actions::resolve(&store, &id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Course not found: {}", id))),
        )
            .into_response();
    };

    let (Some(course), Some(related)) = (
        view(&store, &course_id),
        related_courses(course_id.as_str(), store.curriculum(), store.progress()),
    ) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Course not found: {}", id))),
        )
            .into_response();
    };

    let response = CourseDetailResponse {
        course,
        clauses: clause_status(course_id.as_str(), store.curriculum(), store.progress()),
        related,
    };
    (StatusCode::OK, Json(response)).into_response()
}

// =============================================================================
// PROGRESS HANDLERS
// =============================================================================

/// HTTP status for a rejected mutation.
fn error_status(error: &CoursemapError) -> StatusCode {
    match error {
        CoursemapError::CourseNotFound(_) => StatusCode::NOT_FOUND,
        CoursemapError::CourseLocked(_) => StatusCode::CONFLICT,
        CoursemapError::InvalidGrade(_) | CoursemapError::InvalidSelection(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Respond with the changed course, or the error that stopped the change.
fn progress_response(
    store: &ProgressStore,
    result: Result<(CourseId, Vec<CourseId>), CoursemapError>,
) -> (StatusCode, Json<ProgressResponse>) {
    match result {
        Ok((id, invalidated)) => match view(store, &id) {
            Some(course) => (
                StatusCode::OK,
                Json(ProgressResponse::success(course, invalidated)),
            ),
            None => (
                StatusCode::NOT_FOUND,
                Json(ProgressResponse::error(format!("Course not found: {}", id))),
            ),
        },
        Err(e) => (error_status(&e), Json(ProgressResponse::error(e.to_string()))),
    }
}

/// Complete or uncheck a course.
///
/// Completing a locked course is refused with `409 Conflict`.
pub async fn progress_handler(
    State(state): State<AppState>,
    Json(request): Json<ProgressRequest>,
) -> impl IntoResponse {
    let grade = match request.parsed_grade() {
        Ok(g) => g,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ProgressResponse::error(e.to_string())),
            );
        }
    };

    let mut store = state.store.write().await;
    let result = actions::set_completion(
        &mut store,
        &request.course_id,
        request.completed,
        grade,
        request.option,
    );
    progress_response(&store, result)
}

/// Choose or clear an elective option.
pub async fn option_handler(
    State(state): State<AppState>,
    Json(request): Json<OptionRequest>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    let result = actions::select_option(&mut store, &request.course_id, request.option)
        .map(|id| (id, Vec::new()));
    progress_response(&store, result)
}

/// Choose a value of a variable-credit course.
pub async fn credit_handler(
    State(state): State<AppState>,
    Json(request): Json<CreditRequest>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    let result = actions::select_credit(&mut store, &request.course_id, request.index)
        .map(|id| (id, Vec::new()));
    progress_response(&store, result)
}

/// Clear the live progress map.
pub async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut store = state.store.write().await;
    store.reset();
    Json(ModeResponse {
        success: true,
        simulation: store.is_simulation(),
        changed: true,
    })
}

// =============================================================================
// SIMULATION HANDLERS
// =============================================================================

pub async fn simulation_enter_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut store = state.store.write().await;
    let changed = store.enter_simulation();
    Json(ModeResponse {
        success: true,
        simulation: store.is_simulation(),
        changed,
    })
}

pub async fn simulation_exit_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut store = state.store.write().await;
    let changed = store.exit_simulation();
    Json(ModeResponse {
        success: true,
        simulation: store.is_simulation(),
        changed,
    })
}

/// Fill upcoming courses with grades converging on a target GPA.
pub async fn simulation_run_handler(
    State(state): State<AppState>,
    Json(request): Json<SimulationRunRequest>,
) -> impl IntoResponse {
    let request = match SimulationRequest::new(request.target_gpa, request.count) {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SimulationResponse::error(e.to_string())),
            );
        }
    };

    let mut store = state.store.write().await;
    match store.run_simulation(request) {
        Ok(report) => (StatusCode::OK, Json(SimulationResponse::success(report))),
        Err(e @ SimulationError::NoCandidates) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SimulationResponse::error(e.to_string())),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(SimulationResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// TRANSCRIPT HANDLER
// =============================================================================

/// Import a plain-text transcript, replacing current progress.
///
/// The text is parsed before the store lock is taken.
pub async fn transcript_handler(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
    body: String,
) -> impl IntoResponse {
    let (format, rows) = match read_rows(&TextTranscriptSource(body), query.format).await {
        Ok(parsed) => parsed,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ImportResponse::error(e.to_string())),
            );
        }
    };

    let mut store = state.store.write().await;
    match store.import_rows(&rows) {
        Ok(summary) => (
            StatusCode::OK,
            Json(ImportResponse::success(format, summary)),
        ),
        Err(e @ ImportError::NothingToImport { .. }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ImportResponse::error(e.to_string())),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ImportResponse::error(e.to_string())),
        ),
    }
}
