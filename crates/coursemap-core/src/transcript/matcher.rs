//! Transcript-to-curriculum reconciliation.
//!
//! Rows are processed in transcript order:
//!
//! 1. Rows whose grade is a non-grade marker (`W`, `NC`, ...) are skipped;
//!    rows with a grade outside the standard scale are rejected.
//! 2. A row whose id equals a curriculum course id (ignoring spaces and
//!    case) completes that course. A later row for the same course is a
//!    retake and replaces the earlier grade.
//! 3. Otherwise the row is placed into a free elective slot that offers it
//!    as an option. The curriculum's slot rules narrow the candidate slots;
//!    each slot is filled at most once.
//!
//! Rows that fit nowhere are reported as unmatched.

use super::{ImportError, TranscriptRow};
use crate::curriculum::{Course, Curriculum, SlotOrder};
use crate::primitives::{MAX_TRANSCRIPT_ROWS, NON_GRADE_MARKERS};
use crate::types::{CourseId, Grade, normalize_id};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// A curriculum course completed by a transcript row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAssignment {
    pub course_id: CourseId,
    pub grade: Grade,
    /// Option selected when the row filled an elective slot.
    pub option: Option<usize>,
    /// Row id as printed on the transcript.
    pub source_id: String,
}

/// Everything a transcript resolves to, before it touches the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportPlan {
    pub assignments: Vec<SlotAssignment>,
    pub unmatched: Vec<TranscriptRow>,
    pub skipped: usize,
    pub rejected: usize,
    pub superseded: usize,
}

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub matched: usize,
    pub unmatched: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub superseded: usize,
}

impl ImportPlan {
    #[must_use]
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            matched: self.assignments.len(),
            unmatched: self.unmatched.len(),
            skipped: self.skipped,
            rejected: self.rejected,
            superseded: self.superseded,
        }
    }
}

/// Resolve transcript rows against a curriculum.
pub fn match_transcript(
    curriculum: &Curriculum,
    rows: &[TranscriptRow],
) -> Result<ImportPlan, ImportError> {
    if rows.len() > MAX_TRANSCRIPT_ROWS {
        return Err(ImportError::TooManyRows(rows.len()));
    }

    let mut plan = ImportPlan::default();
    let mut graded = Vec::with_capacity(rows.len());
    for row in rows {
        let grade = row.grade.trim().to_ascii_uppercase();
        if NON_GRADE_MARKERS.contains(&grade.as_str()) {
            plan.skipped += 1;
            continue;
        }
        match grade.parse::<Grade>() {
            Ok(grade) => graded.push((row, grade)),
            Err(_) => {
                debug!(id = %row.id, grade = %row.grade, "Rejected non-standard grade");
                plan.rejected += 1;
            }
        }
    }

    if graded.is_empty() {
        return Err(ImportError::NothingToImport {
            skipped: plan.skipped,
            rejected: plan.rejected,
        });
    }

    // course id -> position in plan.assignments
    let mut filled: BTreeMap<CourseId, usize> = BTreeMap::new();

    for (row, grade) in graded {
        if let Some(course) = curriculum.find_normalized(&row.id) {
            if let Some(&at) = filled.get(&course.id) {
                if let Some(previous) = plan.assignments.get_mut(at) {
                    previous.grade = grade;
                    previous.source_id.clone_from(&row.id);
                }
                plan.superseded += 1;
            } else {
                filled.insert(course.id.clone(), plan.assignments.len());
                plan.assignments.push(SlotAssignment {
                    course_id: course.id.clone(),
                    grade,
                    option: None,
                    source_id: row.id.clone(),
                });
            }
            continue;
        }

        match find_slot(curriculum, &row.id, &filled) {
            Some((slot, option)) => {
                filled.insert(slot.id.clone(), plan.assignments.len());
                plan.assignments.push(SlotAssignment {
                    course_id: slot.id.clone(),
                    grade,
                    option: Some(option),
                    source_id: row.id.clone(),
                });
            }
            None => {
                debug!(id = %row.id, "No free slot for transcript row");
                plan.unmatched.push(row.clone());
            }
        }
    }

    Ok(plan)
}

/// First free slot offering `row_id`, after slot-rule narrowing.
fn find_slot<'a>(
    curriculum: &'a Curriculum,
    row_id: &str,
    filled: &BTreeMap<CourseId, usize>,
) -> Option<(&'a Course, usize)> {
    let key = normalize_id(row_id);
    let mut candidates: Vec<&Course> = curriculum
        .courses()
        .iter()
        .filter(|c| c.option_index(row_id).is_some())
        .collect();

    for rule in curriculum.slot_rules() {
        if !rule.pattern.is_match(&key) {
            continue;
        }
        let primary = pool(&candidates, &rule.primary, rule.order);
        if primary.is_empty() {
            continue;
        }
        let primary_full = primary.iter().all(|c| filled.contains_key(&c.id));
        let overflow = pool(&candidates, &rule.overflow, rule.order);
        candidates = if primary_full && !overflow.is_empty() {
            overflow
        } else {
            primary
        };
    }

    let slot = candidates.into_iter().find(|c| !filled.contains_key(&c.id))?;
    Some((slot, slot.option_index(row_id)?))
}

fn pool<'a>(candidates: &[&'a Course], members: &[CourseId], order: SlotOrder) -> Vec<&'a Course> {
    let mut pool: Vec<&Course> = candidates
        .iter()
        .copied()
        .filter(|c| members.contains(&c.id))
        .collect();
    if order == SlotOrder::Term {
        pool.sort_by_key(|c| c.term);
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curriculum() -> Curriculum {
        Curriculum::from_json(
            r#"{"code":"ME","courses":[
                {"id":"ME101","term":1,"credits":4},
                {"id":"MATH101","term":1,"credits":4},
                {"id":"REXX1","term":3,"credits":3,"options":[
                    {"id":"AFE131"},{"id":"AFE132"},{"id":"HIST200"}]},
                {"id":"REXX2","term":4,"credits":3,"options":[
                    {"id":"AFE131"},{"id":"AFE132"},{"id":"HIST200"}]},
                {"id":"FEXX1","term":5,"credits":3,"options":[
                    {"id":"AFE131"},{"id":"AFE132"},{"id":"AFEA111"}]},
                {"id":"REXX8","term":8,"credits":3,"options":[{"id":"ME410"},{"id":"ME420"}]},
                {"id":"REXX6","term":6,"credits":3,"options":[{"id":"ME410"},{"id":"ME420"}]}
            ],
            "slotRules":[
                {"pattern":"^AFE(A)?1(31|32|11|12)$","primary":["REXX1","REXX2"],
                 "overflow":["FEXX1"]},
                {"pattern":"^[A-Z]{2,4}\\d{3}$","primary":["REXX6","REXX8"],"order":"term"}
            ]}"#,
        )
        .expect("curriculum")
    }

    fn rows(pairs: &[(&str, &str)]) -> Vec<TranscriptRow> {
        pairs.iter().map(|(id, g)| TranscriptRow::new(*id, *g)).collect()
    }

    fn assigned(plan: &ImportPlan) -> Vec<(&str, Grade, Option<usize>)> {
        plan.assignments
            .iter()
            .map(|a| (a.course_id.as_str(), a.grade, a.option))
            .collect()
    }

    #[test]
    fn exact_match_ignores_spacing_and_case() {
        let plan = match_transcript(&curriculum(), &rows(&[("me 101", "aa")])).expect("plan");
        assert_eq!(assigned(&plan), vec![("ME101", Grade::AA, None)]);
    }

    #[test]
    fn retake_replaces_earlier_grade() {
        let plan = match_transcript(
            &curriculum(),
            &rows(&[("MATH 101", "FF"), ("ME 101", "BB"), ("MATH 101", "CC")]),
        )
        .expect("plan");
        assert_eq!(
            assigned(&plan),
            vec![("MATH101", Grade::CC, None), ("ME101", Grade::BB, None)]
        );
        assert_eq!(plan.superseded, 1);
    }

    #[test]
    fn markers_skipped_and_nonstandard_rejected() {
        let plan = match_transcript(
            &curriculum(),
            &rows(&[("ME 101", "W"), ("ME 101", "nc"), ("MATH 101", "FD"), ("ME 101", "BA")]),
        )
        .expect("plan");
        assert_eq!(plan.skipped, 2);
        assert_eq!(plan.rejected, 1);
        assert_eq!(assigned(&plan), vec![("ME101", Grade::BA, None)]);
    }

    #[test]
    fn nothing_to_import() {
        let result = match_transcript(&curriculum(), &rows(&[("ME 101", "P"), ("X 1", "FD")]));
        assert!(matches!(
            result,
            Err(ImportError::NothingToImport { skipped: 1, rejected: 1 })
        ));
        assert!(matches!(
            match_transcript(&curriculum(), &[]),
            Err(ImportError::NothingToImport { skipped: 0, rejected: 0 })
        ));
    }

    #[test]
    fn afe_courses_fill_primary_then_overflow() {
        let plan = match_transcript(
            &curriculum(),
            &rows(&[("AFE 131", "AA"), ("AFE 132", "BA"), ("AFE 131", "BB")]),
        )
        .expect("plan");
        assert_eq!(
            assigned(&plan),
            vec![
                ("REXX1", Grade::AA, Some(0)),
                ("REXX2", Grade::BA, Some(1)),
                ("FEXX1", Grade::BB, Some(0)),
            ]
        );
    }

    #[test]
    fn rule_without_primary_overlap_does_not_narrow() {
        let plan = match_transcript(&curriculum(), &rows(&[("AFEA 111", "CC")])).expect("plan");
        assert_eq!(assigned(&plan), vec![("FEXX1", Grade::CC, Some(2))]);
    }

    #[test]
    fn department_electives_fill_by_term() {
        let plan = match_transcript(
            &curriculum(),
            &rows(&[("ME 420", "AA"), ("ME 410", "BB")]),
        )
        .expect("plan");
        assert_eq!(
            assigned(&plan),
            vec![("REXX6", Grade::AA, Some(1)), ("REXX8", Grade::BB, Some(0))]
        );
    }

    #[test]
    fn slot_filled_once_then_unmatched() {
        let plan = match_transcript(
            &curriculum(),
            &rows(&[("ME 410", "AA"), ("ME 420", "BA"), ("ME 410", "CC")]),
        )
        .expect("plan");
        assert_eq!(plan.assignments.len(), 2);
        assert_eq!(plan.unmatched, vec![TranscriptRow::new("ME 410", "CC")]);
        assert_eq!(plan.summary().unmatched, 1);
    }

    #[test]
    fn unknown_course_is_unmatched() {
        let plan = match_transcript(&curriculum(), &rows(&[("CHEM 999", "AA")])).expect("plan");
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.summary().unmatched, 1);
    }

    #[test]
    fn too_many_rows() {
        let many = vec![TranscriptRow::new("ME 101", "AA"); MAX_TRANSCRIPT_ROWS + 1];
        assert!(matches!(
            match_transcript(&curriculum(), &many),
            Err(ImportError::TooManyRows(_))
        ));
    }
}
