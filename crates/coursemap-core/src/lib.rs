//! # coursemap-core
//!
//! The deterministic curriculum progress engine for Coursemap - THE LOGIC.
//!
//! This crate decides, for one department's curriculum, which courses are
//! locked by unmet prerequisites, what a student has earned, what grades
//! would carry them to a target GPA, and where each transcript line belongs.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Changes progress only through [`ProgressStore`] methods
//! - Recomputes lock state and metrics from the current map on every query
//! - Uses integer fixed-point arithmetic only (grade points in hundredths)
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod curriculum;
pub mod formats;
pub mod metrics;
pub mod prereq;
pub mod primitives;
pub mod simulation;
pub mod storage;
pub mod store;
pub mod transcript;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{CourseId, CoursemapError, Gpa, Grade, ProgressEntry, ProgressMap};

// =============================================================================
// RE-EXPORTS: Curriculum & Evaluation
// =============================================================================

pub use curriculum::{
    CountPattern, Course, CourseOption, Credits, Curriculum, CurriculumDocument, Prereq, SlotOrder,
    SlotRule,
};
pub use metrics::{GradeTotals, Metrics, calculate_metrics, earned_credits};
pub use prereq::{
    ClauseStatus, PatternMember, RelatedCourses, clause_status, find_dependents, is_locked,
    is_satisfied, related_courses,
};

// =============================================================================
// RE-EXPORTS: Progress Store
// =============================================================================

pub use storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend};
pub use store::{ChangeKind, ProgressEvent, ProgressObserver, ProgressStore};

// =============================================================================
// RE-EXPORTS: Simulation & Transcript
// =============================================================================

pub use simulation::{
    SimulatedGrade, SimulationCandidate, SimulationCandidates, SimulationError,
    SimulationReport, SimulationRequest, assign_grades, simulation_candidates,
};
pub use transcript::{
    ImportError, ImportPlan, ImportSummary, SlotAssignment, TranscriptFormat, TranscriptRow,
    match_transcript, parse_transcript,
};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{progress_from_json, progress_to_json};
