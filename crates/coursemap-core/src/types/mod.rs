//! # Core Type Definitions
//!
//! This module contains the core value types shared by every Coursemap module:
//! - Course identifiers (`CourseId`)
//! - The letter-grade scale (`Grade`)
//! - Fixed-point grade point averages (`Gpa`)
//! - Per-course progress (`ProgressEntry`, `ProgressMap`)
//! - Error types (`CoursemapError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (grade points are held as hundredths)
//! - Implement `Ord` where they key a `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// COURSE IDENTIFIER
// =============================================================================

/// Identifier of a course (or curriculum slot) within one curriculum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl CourseId {
    /// Create a new course id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id with all whitespace removed and letters upper-cased.
    ///
    /// Transcripts print `ME 101`, curricula store `ME101`; both normalize
    /// to the same key.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize_id(&self.0)
    }
}

impl Borrow<str> for CourseId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CourseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Whitespace-insensitive, case-insensitive form of a course id.
#[must_use]
pub fn normalize_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

// =============================================================================
// GRADE SCALE
// =============================================================================

/// A letter grade on the institution's scale.
///
/// `FF` is the only failing grade; every other grade passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    AA,
    BA,
    BB,
    CB,
    CC,
    DC,
    DD,
    FF,
}

impl Grade {
    /// The full scale, highest grade first.
    pub const ALL: [Grade; 8] = [
        Grade::AA,
        Grade::BA,
        Grade::BB,
        Grade::CB,
        Grade::CC,
        Grade::DC,
        Grade::DD,
        Grade::FF,
    ];

    /// Grade points in hundredths (`AA` = 400 … `FF` = 0).
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Grade::AA => 400,
            Grade::BA => 350,
            Grade::BB => 300,
            Grade::CB => 250,
            Grade::CC => 200,
            Grade::DC => 150,
            Grade::DD => 100,
            Grade::FF => 0,
        }
    }

    /// Whether the grade earns the course's credits.
    #[must_use]
    pub const fn is_passing(self) -> bool {
        !matches!(self, Grade::FF)
    }

    /// Letter code as printed on a transcript.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Grade::AA => "AA",
            Grade::BA => "BA",
            Grade::BB => "BB",
            Grade::CB => "CB",
            Grade::CC => "CC",
            Grade::DC => "DC",
            Grade::DD => "DD",
            Grade::FF => "FF",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = CoursemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Grade::ALL
            .into_iter()
            .find(|g| g.as_str() == upper)
            .ok_or_else(|| CoursemapError::InvalidGrade(s.to_string()))
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Grade>` stored as `""` when ungraded.
mod grade_field {
    use super::Grade;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(grade: &Option<Grade>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(grade.map_or("", Grade::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Grade>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// GPA (FIXED POINT)
// =============================================================================

/// A grade point average held as hundredths (`3.25` is `Gpa(325)`).
///
/// Parsed from and displayed as a two-decimal string. No floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Gpa(pub u32);

impl Gpa {
    /// The empty average (no graded credits).
    pub const ZERO: Gpa = Gpa(0);

    /// The top of the scale.
    pub const MAX: Gpa = Gpa(Grade::AA.points());

    /// Create from hundredths.
    #[must_use]
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    /// Get the raw hundredths value.
    #[must_use]
    pub const fn hundredths(self) -> u32 {
        self.0
    }

    /// Absolute distance to another average, in hundredths.
    #[must_use]
    pub const fn distance(self, other: Gpa) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Gpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Gpa {
    type Err = CoursemapError;

    /// Parse `"3"`, `"3.5"` or `"3.25"`. A third decimal rounds half-up;
    /// further decimals are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoursemapError::InvalidGpa(s.to_string());
        let trimmed = s.trim();
        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let digits: Vec<u32> = frac.bytes().map(|b| u32::from(b - b'0')).collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = u32::from(digits.get(2).is_some_and(|d| *d >= 5));

        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(tenths * 10 + hundredths + round_up))
            .map(Gpa)
            .ok_or_else(invalid)
    }
}

impl Serialize for Gpa {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Gpa {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GpaVisitor;

        impl serde::de::Visitor<'_> for GpaVisitor {
            type Value = Gpa;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a grade point average such as \"3.25\" or 3.25")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Gpa, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Gpa, E> {
                u32::try_from(v)
                    .ok()
                    .and_then(|w| w.checked_mul(100))
                    .map(Gpa)
                    .ok_or_else(|| E::custom(format!("GPA out of range: {v}")))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Gpa, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("GPA must not be negative: {v}")))
                    .and_then(|u| self.visit_u64(u))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Gpa, E> {
                v.to_string().parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(GpaVisitor)
    }
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Progress recorded for one curriculum course.
///
/// Field names match the persisted JSON layout (`selectedOption`,
/// `selectedCreditIndex`, `isSimulation`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    /// Whether the course is marked completed.
    #[serde(default)]
    pub completed: bool,
    /// The grade, or `None` when ungraded.
    #[serde(default, with = "grade_field")]
    pub grade: Option<Grade>,
    /// Chosen elective option, indexing the course's `options`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<usize>,
    /// Chosen value of a variable-credit course.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_credit_index: Option<usize>,
    /// Set on entries produced while simulation mode is active.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_simulation: bool,
}

impl ProgressEntry {
    /// Completed with a passing grade.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.completed && self.grade.is_some_and(Grade::is_passing)
    }

    /// Completed with any grade (passing or failing).
    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.completed && self.grade.is_some()
    }

    /// Force the entry back to `{completed: false, grade: ""}`.
    pub fn invalidate(&mut self) {
        self.completed = false;
        self.grade = None;
        self.selected_credit_index = None;
    }
}

/// Mapping from course id to progress, for one department.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap(BTreeMap<CourseId, ProgressEntry>);

impl ProgressMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for a course, if one was ever recorded.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProgressEntry> {
        self.0.get(id)
    }

    /// Get a mutable entry, if one exists.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ProgressEntry> {
        self.0.get_mut(id)
    }

    /// Get the entry for a course, creating the default one if absent.
    pub fn entry(&mut self, id: &CourseId) -> &mut ProgressEntry {
        self.0.entry(id.clone()).or_default()
    }

    /// Whether the course is completed with a passing grade.
    #[must_use]
    pub fn is_passed(&self, id: &str) -> bool {
        self.get(id).is_some_and(ProgressEntry::is_passed)
    }

    /// Whether the course is marked completed.
    #[must_use]
    pub fn is_completed(&self, id: &str) -> bool {
        self.get(id).is_some_and(|e| e.completed)
    }

    /// Iterate entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&CourseId, &ProgressEntry)> {
        self.0.iter()
    }

    /// Iterate mutable entries in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&CourseId, &mut ProgressEntry)> {
        self.0.iter_mut()
    }

    /// Ids of every completed course, in id order.
    #[must_use]
    pub fn completed_ids(&self) -> Vec<CourseId> {
        self.0
            .iter()
            .filter(|(_, e)| e.completed)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no entry was ever recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Coursemap system.
///
/// - No silent failures on load: malformed curricula are rejected up front
/// - Use `Result<T, CoursemapError>` for fallible operations
/// - The CORE should never panic; all errors must be recoverable
#[derive(Debug, Error)]
pub enum CoursemapError {
    /// The requested course does not exist in the active curriculum.
    #[error("Course not found: {0}")]
    CourseNotFound(String),

    /// The course has unmet prerequisites and cannot be completed.
    #[error("Course is locked by unmet prerequisites: {0}")]
    CourseLocked(String),

    /// Two curriculum courses share one id.
    #[error("Duplicate course id: {0}")]
    DuplicateCourse(String),

    /// A course term is outside 1..=9.
    #[error("Course {course} has invalid term {term}")]
    InvalidTerm { course: String, term: u8 },

    /// A variable-credit course lists no credit values.
    #[error("Course {0} has an empty credit list")]
    EmptyCredits(String),

    /// A prerequisite names a course that is not in the curriculum.
    #[error("Course {course} has {credits} credits (max {max})", max = crate::primitives::MAX_COURSE_CREDITS)]
    ExcessiveCredits { course: String, credits: u32 },

    #[error("Course {course} references unknown prerequisite {prereq}")]
    UnresolvedPrereq { course: String, prereq: String },

    /// A prerequisite object has an unknown `type`.
    #[error("Course {course} has unsupported prerequisite type {kind}")]
    UnsupportedPrereq { course: String, kind: String },

    /// A count-pattern or slot-rule regex failed to compile.
    #[error("Invalid pattern {pattern} ({context}): {reason}")]
    InvalidPattern {
        context: String,
        pattern: String,
        reason: String,
    },

    /// A slot rule names a slot that is not in the curriculum.
    #[error("Slot rule {pattern} references unknown slot {slot}")]
    UnknownSlot { pattern: String, slot: String },

    /// An option or credit index the course does not offer.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// A grade string is not on the standard scale.
    #[error("Invalid grade: {0}")]
    InvalidGrade(String),

    /// A GPA string could not be parsed.
    #[error("Invalid GPA: {0}")]
    InvalidGpa(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    #[error(transparent)]
    Simulation(#[from] crate::simulation::SimulationError),

    #[error(transparent)]
    Import(#[from] crate::transcript::ImportError),
}

// =============================================================================
// TESTS
// =============================================================================
