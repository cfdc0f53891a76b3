//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use crate::transcript::FormatChoice;
use coursemap_core::{
    ClauseStatus, Course, CourseId, Credits, Gpa, Grade, ImportSummary, ProgressStore,
    RelatedCourses, SimulationReport, TranscriptFormat,
    primitives::{DEFAULT_SIMULATION_COUNT, DEFAULT_SIMULATION_TARGET},
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Department status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub department: String,
    pub name: String,
    pub total_courses: usize,
    pub completed_courses: usize,
    pub earned_credits: u32,
    pub graded_credits: u32,
    pub gpa: Gpa,
    pub simulation: bool,
    /// Incremented on every progress change.
    pub revision: u64,
}

impl StatusResponse {
    #[must_use]
    pub fn new(store: &ProgressStore, revision: u64) -> Self {
        let metrics = store.metrics();
        Self {
            department: store.department().to_string(),
            name: store.curriculum().name().to_string(),
            total_courses: store.curriculum().len(),
            completed_courses: metrics.completed_courses,
            earned_credits: metrics.earned_credits,
            graded_credits: metrics.graded_credits,
            gpa: metrics.gpa,
            simulation: store.is_simulation(),
            revision,
        }
    }
}

// =============================================================================
// COURSE VIEWS
// =============================================================================

/// One course as the client renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseView {
    /// Curriculum id (the slot id for electives).
    pub id: CourseId,
    /// Selected option's id, or `id`.
    pub display_id: CourseId,
    pub name: String,
    pub term: u8,
    /// Credits counted under the current selection.
    pub credits: u32,
    pub credit_options: Credits,
    pub locked: bool,
    pub completed: bool,
    pub grade: Option<Grade>,
    pub selected_option: Option<usize>,
    pub selected_credit_index: Option<usize>,
    pub options: Vec<CourseId>,
    pub is_simulation: bool,
}

impl CourseView {
    #[must_use]
    pub fn new(course: &Course, store: &ProgressStore) -> Self {
        let entry = store.progress().get(course.id.as_str());
        Self {
            id: course.id.clone(),
            display_id: course.display_id(entry).clone(),
            name: course.display_name(entry).to_string(),
            term: course.term,
            credits: course.effective_credits(entry),
            credit_options: course.effective_credit_options(entry).clone(),
            locked: store.is_locked(course.id.as_str()),
            completed: entry.is_some_and(|e| e.completed),
            grade: entry.and_then(|e| e.grade),
            selected_option: entry.and_then(|e| e.selected_option),
            selected_credit_index: entry.and_then(|e| e.selected_credit_index),
            options: course.options.iter().map(|o| o.id.clone()).collect(),
            is_simulation: entry.is_some_and(|e| e.is_simulation),
        }
    }
}

/// Every course of the active curriculum, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursesResponse {
    pub department: String,
    pub courses: Vec<CourseView>,
}

/// One course with its clause evaluation and neighbourhood.
#[derive(Debug, Clone, Serialize)]
pub struct CourseDetailResponse {
    pub course: CourseView,
    pub clauses: Vec<ClauseStatus>,
    pub related: RelatedCourses,
}

// =============================================================================
// PROGRESS REQUESTS/RESPONSE
// =============================================================================

/// Mark a course completed or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRequest {
    pub course_id: String,
    pub completed: bool,
    /// Letter grade (`"AA"`..`"FF"`); keeps the stored grade when absent.
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub option: Option<usize>,
}

impl ProgressRequest {
    /// Parse the grade field, if present.
    pub fn parsed_grade(&self) -> Result<Option<Grade>, coursemap_core::CoursemapError> {
        self.grade
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .map(|g| g.parse::<Grade>())
            .transpose()
    }
}

/// Choose or clear an elective option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionRequest {
    pub course_id: String,
    #[serde(default)]
    pub option: Option<usize>,
}

/// Choose a value of a variable-credit course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRequest {
    pub course_id: String,
    pub index: usize,
}

/// Result of a single-course mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub course: Option<CourseView>,
    /// Courses forced back to incomplete by this change.
    #[serde(default)]
    pub invalidated: Vec<CourseId>,
    pub error: Option<String>,
}

impl ProgressResponse {
    #[must_use]
    pub fn success(course: CourseView, invalidated: Vec<CourseId>) -> Self {
        Self {
            success: true,
            course: Some(course),
            invalidated,
            error: None,
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            course: None,
            invalidated: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

/// Result of a mode switch or reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeResponse {
    pub success: bool,
    /// Whether simulation mode is active afterwards.
    pub simulation: bool,
    /// Whether the call changed anything.
    pub changed: bool,
}

// =============================================================================
// SIMULATION REQUEST/RESPONSE
// =============================================================================

fn default_target() -> Gpa {
    Gpa::from_hundredths(DEFAULT_SIMULATION_TARGET)
}

fn default_count() -> i64 {
    DEFAULT_SIMULATION_COUNT
}

/// Run the grade simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRunRequest {
    #[serde(default = "default_target")]
    pub target_gpa: Gpa,
    #[serde(default = "default_count")]
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResponse {
    pub success: bool,
    pub report: Option<SimulationReport>,
    pub error: Option<String>,
}

impl SimulationResponse {
    #[must_use]
    pub fn success(report: SimulationReport) -> Self {
        Self {
            success: true,
            report: Some(report),
            error: None,
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// TRANSCRIPT QUERY/RESPONSE
// =============================================================================

/// Query string of `POST /transcript`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TranscriptQuery {
    #[serde(default)]
    pub format: FormatChoice,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub format: Option<TranscriptFormat>,
    pub summary: Option<ImportSummary>,
    pub error: Option<String>,
}

impl ImportResponse {
    #[must_use]
    pub fn success(format: TranscriptFormat, summary: ImportSummary) -> Self {
        Self {
            success: true,
            format: Some(format),
            summary: Some(summary),
            error: None,
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            format: None,
            summary: None,
            error: Some(msg.into()),
        }
    }
}

/// Error body for lookups that have no richer response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
