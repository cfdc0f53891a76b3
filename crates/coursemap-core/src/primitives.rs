//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Coursemap CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Anything that varies per department (courses, slot rules) lives in the
//! curriculum document instead.

/// First real term of a curriculum.
pub const FIRST_TERM: u8 = 1;

/// The "extra" term bucket.
///
/// Courses in term 9 are overflow slots, not a real semester. They are
/// valid curriculum members and take part in every computation.
pub const EXTRA_TERM: u8 = 9;

/// Prefix marking a soft prerequisite (`"!MATH101"`).
///
/// Soft clauses are satisfied exactly like plain ones.
pub const SOFT_PREREQ_MARKER: char = '!';

/// Transcript grade markers that carry no grade (not counted, not rejected).
///
/// Compared case-insensitively.
pub const NON_GRADE_MARKERS: &[&str] = &["NC", "W", "I", "P", "X", "T", "ND", "R", "L", "RR"];

/// `type` tag of a count-pattern prerequisite object.
pub const COUNT_PATTERN_KIND: &str = "count_pattern";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of transcript rows accepted in one import.
///
/// Larger inputs are rejected to prevent DoS.
pub const MAX_TRANSCRIPT_ROWS: usize = 2000;

/// Largest credit value a single course (or credit choice) may carry.
pub const MAX_COURSE_CREDITS: u32 = 60;

/// Maximum size of a persisted progress payload (4 MiB).
///
/// Payloads larger than this are treated as malformed on load.
pub const MAX_PERSISTED_PAYLOAD: usize = 4 * 1024 * 1024;

// =============================================================================
// SIMULATION DEFAULTS
// =============================================================================

/// Default target GPA for a simulation run, in hundredths.
pub const DEFAULT_SIMULATION_TARGET: u32 = 300;

/// Default number of courses a simulation run fills.
pub const DEFAULT_SIMULATION_COUNT: i64 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_term_closes_range() {
        assert!(FIRST_TERM < EXTRA_TERM);
        assert_eq!(EXTRA_TERM, 9);
    }

    #[test]
    fn markers_are_upper_case() {
        for marker in NON_GRADE_MARKERS {
            assert_eq!(*marker, marker.to_ascii_uppercase());
        }
    }
}
