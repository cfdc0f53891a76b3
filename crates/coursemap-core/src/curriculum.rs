//! # Curriculum Model
//!
//! The static description of one department's program: courses, terms,
//! credits, prerequisite clauses, elective options and slot rules.
//!
//! A [`Curriculum`] is built once from a JSON [`CurriculumDocument`] and is
//! immutable afterwards. Every structural problem (duplicate ids, unknown
//! prerequisite targets, bad regexes) is reported at load time so that the
//! evaluators never meet a dangling reference.

use crate::primitives::{
    COUNT_PATTERN_KIND, EXTRA_TERM, FIRST_TERM, MAX_COURSE_CREDITS, SOFT_PREREQ_MARKER,
};
use crate::types::{CourseId, CoursemapError, ProgressEntry, normalize_id};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// CREDITS
// =============================================================================

/// Credit value of a course: fixed, or a list of choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credits {
    Fixed(u32),
    Variable(Vec<u32>),
}

impl Credits {
    /// Resolve the credit value for a selected index.
    ///
    /// Variable credits default to the first choice when no index is
    /// selected or the index is out of range.
    #[must_use]
    pub fn value_at(&self, index: Option<usize>) -> u32 {
        match self {
            Credits::Fixed(n) => *n,
            Credits::Variable(values) => index
                .and_then(|i| values.get(i))
                .or_else(|| values.first())
                .copied()
                .unwrap_or(0),
        }
    }

    /// Number of selectable values (1 for fixed credits).
    #[must_use]
    pub fn choices(&self) -> usize {
        match self {
            Credits::Fixed(_) => 1,
            Credits::Variable(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Credits::Variable(_))
    }
}

// =============================================================================
// PREREQUISITES
// =============================================================================

/// One prerequisite clause.
#[derive(Debug, Clone)]
pub enum Prereq {
    /// Another course must be passed. `soft` records the `!` marker.
    Course { id: CourseId, soft: bool },
    /// Enough passed courses must match a pattern.
    CountPattern(CountPattern),
    /// Earned credits must reach a threshold (`"100 Credits"`).
    MinCredits(u32),
}

impl Prereq {
    /// The referenced course for plain and soft clauses.
    #[must_use]
    pub fn course_id(&self) -> Option<&CourseId> {
        match self {
            Prereq::Course { id, .. } => Some(id),
            _ => None,
        }
    }

    fn parse_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(credits) = parse_credit_threshold(trimmed) {
            return Prereq::MinCredits(credits);
        }
        match trimmed.strip_prefix(SOFT_PREREQ_MARKER) {
            Some(id) => Prereq::Course {
                id: CourseId::new(id.trim()),
                soft: true,
            },
            None => Prereq::Course {
                id: CourseId::new(trimmed),
                soft: false,
            },
        }
    }
}

/// `"<N> Credits"` / `"<N> Credit"`, case-insensitive.
fn parse_credit_threshold(raw: &str) -> Option<u32> {
    let mut parts = raw.split_whitespace();
    let (count, unit) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let is_unit = unit.eq_ignore_ascii_case("credit") || unit.eq_ignore_ascii_case("credits");
    if !is_unit || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    count.parse().ok()
}

/// A count-pattern clause: at least `min_count` passed courses whose id
/// matches `pattern`, not counting ids in `exclude`.
#[derive(Debug, Clone)]
pub struct CountPattern {
    pub pattern: Regex,
    pub exclude: Vec<CourseId>,
    pub min_count: u32,
    pub message: String,
}

impl CountPattern {
    /// Whether a course id is a member of this clause.
    #[must_use]
    pub fn includes(&self, id: &CourseId) -> bool {
        self.pattern.is_match(id.as_str()) && !self.exclude.contains(id)
    }
}

// =============================================================================
// COURSES
// =============================================================================

/// An alternative identity of an elective slot.
#[derive(Debug, Clone)]
pub struct CourseOption {
    pub id: CourseId,
    pub name: String,
    pub credits: Option<Credits>,
    pub prereqs: Vec<Prereq>,
}

/// One curriculum course (or elective slot).
#[derive(Debug, Clone)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub term: u8,
    pub credits: Credits,
    pub prereqs: Vec<Prereq>,
    pub options: Vec<CourseOption>,
}

impl Course {
    /// The option chosen by an entry, if its index is valid.
    #[must_use]
    pub fn selected_option(&self, entry: Option<&ProgressEntry>) -> Option<&CourseOption> {
        entry
            .and_then(|e| e.selected_option)
            .and_then(|i| self.options.get(i))
    }

    /// Own clauses followed by the selected option's clauses.
    pub fn effective_prereqs(&self, entry: Option<&ProgressEntry>) -> impl Iterator<Item = &Prereq> {
        let option = self.selected_option(entry);
        self.prereqs
            .iter()
            .chain(option.into_iter().flat_map(|o| o.prereqs.iter()))
    }

    /// Whether an effective plain or soft clause names `target`.
    #[must_use]
    pub fn requires(&self, target: &str, entry: Option<&ProgressEntry>) -> bool {
        self.effective_prereqs(entry)
            .filter_map(Prereq::course_id)
            .any(|id| id.as_str() == target)
    }

    /// The credit definition in effect (the option's, if it has one).
    #[must_use]
    pub fn effective_credit_options(&self, entry: Option<&ProgressEntry>) -> &Credits {
        self.selected_option(entry)
            .and_then(|o| o.credits.as_ref())
            .unwrap_or(&self.credits)
    }

    /// Credits counted for this course under an entry.
    #[must_use]
    pub fn effective_credits(&self, entry: Option<&ProgressEntry>) -> u32 {
        self.effective_credit_options(entry)
            .value_at(entry.and_then(|e| e.selected_credit_index))
    }

    /// Displayed id (the selected option's, if any).
    #[must_use]
    pub fn display_id(&self, entry: Option<&ProgressEntry>) -> &CourseId {
        self.selected_option(entry).map_or(&self.id, |o| &o.id)
    }

    /// Displayed name (the selected option's, if any).
    #[must_use]
    pub fn display_name(&self, entry: Option<&ProgressEntry>) -> &str {
        self.selected_option(entry).map_or(&self.name, |o| &o.name)
    }

    /// Index of the option whose id equals `id`, ignoring spaces and case.
    #[must_use]
    pub fn option_index(&self, id: &str) -> Option<usize> {
        let wanted = normalize_id(id);
        self.options.iter().position(|o| o.id.normalized() == wanted)
    }
}

// =============================================================================
// SLOT RULES
// =============================================================================

/// How a slot pool is ordered before the first free slot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotOrder {
    /// Curriculum declaration order.
    #[default]
    Declaration,
    /// Ascending term, declaration order within a term.
    Term,
}

/// Priority rule for placing a transcript course into an elective slot.
#[derive(Debug, Clone)]
pub struct SlotRule {
    pub pattern: Regex,
    pub primary: Vec<CourseId>,
    pub overflow: Vec<CourseId>,
    pub order: SlotOrder,
}

// =============================================================================
// DOCUMENT (JSON) FORM
// =============================================================================

/// A prerequisite as written in a curriculum document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PrereqDocument {
    Text(String),
    Object(PrereqObject),
}

/// Object-form prerequisite (`{"type": "count_pattern", ...}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrereqObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub pattern: String,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub min_count: u32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub credits: Option<Credits>,
    #[serde(default)]
    pub prereqs: Vec<PrereqDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub term: u8,
    pub credits: Credits,
    #[serde(default)]
    pub prereqs: Vec<PrereqDocument>,
    #[serde(default)]
    pub options: Vec<OptionDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotRuleDocument {
    pub pattern: String,
    pub primary: Vec<String>,
    #[serde(default)]
    pub overflow: Vec<String>,
    #[serde(default)]
    pub order: SlotOrder,
}

/// A department curriculum as stored on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumDocument {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub courses: Vec<CourseDocument>,
    #[serde(default)]
    pub slot_rules: Vec<SlotRuleDocument>,
}

// =============================================================================
// CURRICULUM
// =============================================================================

/// A validated, immutable curriculum.
#[derive(Debug, Clone)]
pub struct Curriculum {
    code: String,
    name: String,
    courses: Vec<Course>,
    index: BTreeMap<CourseId, usize>,
    slot_rules: Vec<SlotRule>,
}

impl Curriculum {
    /// Parse and validate a curriculum JSON document.
    pub fn from_json(json: &str) -> Result<Self, CoursemapError> {
        let document: CurriculumDocument = serde_json::from_str(json)
            .map_err(|e| CoursemapError::DeserializationError(e.to_string()))?;
        Self::from_document(document)
    }

    /// Validate a parsed document.
    pub fn from_document(document: CurriculumDocument) -> Result<Self, CoursemapError> {
        let mut index = BTreeMap::new();
        for (position, course) in document.courses.iter().enumerate() {
            let id = CourseId::new(course.id.trim());
            if index.insert(id, position).is_some() {
                return Err(CoursemapError::DuplicateCourse(course.id.clone()));
            }
        }

        let mut courses = Vec::with_capacity(document.courses.len());
        for raw in document.courses {
            courses.push(build_course(raw, &index)?);
        }

        let slot_rules = document
            .slot_rules
            .into_iter()
            .map(|raw| build_slot_rule(raw, &index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            code: document.code,
            name: document.name,
            courses,
            index,
            slot_rules,
        })
    }

    /// Department code (the persistence key).
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All courses in declaration order.
    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Look up a course by exact id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Course> {
        self.index.get(id).and_then(|&i| self.courses.get(i))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Declaration position of a course.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Look up a course ignoring whitespace and case.
    #[must_use]
    pub fn find_normalized(&self, id: &str) -> Option<&Course> {
        let wanted = normalize_id(id);
        self.courses.iter().find(|c| c.id.normalized() == wanted)
    }

    /// Courses of one term, in declaration order.
    pub fn courses_in_term(&self, term: u8) -> impl Iterator<Item = &Course> {
        self.courses.iter().filter(move |c| c.term == term)
    }

    /// Distinct terms present, ascending.
    #[must_use]
    pub fn terms(&self) -> Vec<u8> {
        let mut terms: Vec<u8> = self.courses.iter().map(|c| c.term).collect();
        terms.sort_unstable();
        terms.dedup();
        terms
    }

    /// Elective slot priority rules, in table order.
    #[must_use]
    pub fn slot_rules(&self) -> &[SlotRule] {
        &self.slot_rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

fn build_course(
    raw: CourseDocument,
    index: &BTreeMap<CourseId, usize>,
) -> Result<Course, CoursemapError> {
    let id = CourseId::new(raw.id.trim());

    if !(FIRST_TERM..=EXTRA_TERM).contains(&raw.term) {
        return Err(CoursemapError::InvalidTerm {
            course: id.0,
            term: raw.term,
        });
    }
    check_credits(&id, &raw.credits)?;

    let prereqs = build_prereqs(&id, raw.prereqs, index)?;

    let mut options = Vec::with_capacity(raw.options.len());
    for option in raw.options {
        if let Some(credits) = &option.credits {
            check_credits(&id, credits)?;
        }
        options.push(CourseOption {
            id: CourseId::new(option.id.trim()),
            name: option.name,
            credits: option.credits,
            prereqs: build_prereqs(&id, option.prereqs, index)?,
        });
    }

    Ok(Course {
        id,
        name: raw.name,
        term: raw.term,
        credits: raw.credits,
        prereqs,
        options,
    })
}

fn check_credits(course: &CourseId, credits: &Credits) -> Result<(), CoursemapError> {
    let values: &[u32] = match credits {
        Credits::Fixed(n) => std::slice::from_ref(n),
        Credits::Variable(values) => values,
    };
    if values.is_empty() {
        return Err(CoursemapError::EmptyCredits(course.0.clone()));
    }
    match values.iter().find(|&&n| n > MAX_COURSE_CREDITS) {
        Some(&credits) => Err(CoursemapError::ExcessiveCredits {
            course: course.0.clone(),
            credits,
        }),
        None => Ok(()),
    }
}

fn build_prereqs(
    course: &CourseId,
    raw: Vec<PrereqDocument>,
    index: &BTreeMap<CourseId, usize>,
) -> Result<Vec<Prereq>, CoursemapError> {
    raw.into_iter()
        .map(|clause| build_prereq(course, clause, index))
        .collect()
}

fn build_prereq(
    course: &CourseId,
    raw: PrereqDocument,
    index: &BTreeMap<CourseId, usize>,
) -> Result<Prereq, CoursemapError> {
    match raw {
        PrereqDocument::Text(text) => {
            let clause = Prereq::parse_text(&text);
            if let Some(target) = clause.course_id()
                && !index.contains_key(target)
            {
                return Err(CoursemapError::UnresolvedPrereq {
                    course: course.0.clone(),
                    prereq: text,
                });
            }
            Ok(clause)
        }
        PrereqDocument::Object(object) => {
            if object.kind != COUNT_PATTERN_KIND {
                return Err(CoursemapError::UnsupportedPrereq {
                    course: course.0.clone(),
                    kind: object.kind,
                });
            }
            let pattern = compile(&object.pattern, || format!("prerequisite of {course}"))?;
            Ok(Prereq::CountPattern(CountPattern {
                pattern,
                exclude: object.exclude.iter().map(|e| CourseId::new(e.trim())).collect(),
                min_count: object.min_count,
                message: object.message,
            }))
        }
    }
}

fn build_slot_rule(
    raw: SlotRuleDocument,
    index: &BTreeMap<CourseId, usize>,
) -> Result<SlotRule, CoursemapError> {
    let pattern = compile(&raw.pattern, || "slot rule".to_string())?;
    let resolve = |slots: Vec<String>| {
        slots
            .into_iter()
            .map(|slot| {
                let id = CourseId::new(slot.trim());
                if index.contains_key(&id) {
                    Ok(id)
                } else {
                    Err(CoursemapError::UnknownSlot {
                        pattern: raw.pattern.clone(),
                        slot,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()
    };
    let primary = resolve(raw.primary)?;
    let overflow = resolve(raw.overflow)?;

    Ok(SlotRule {
        pattern,
        primary,
        overflow,
        order: raw.order,
    })
}

fn compile(pattern: &str, context: impl FnOnce() -> String) -> Result<Regex, CoursemapError> {
    Regex::new(pattern).map_err(|e| CoursemapError::InvalidPattern {
        context: context(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// TESTS
// =============================================================================
