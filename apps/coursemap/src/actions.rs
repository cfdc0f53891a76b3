//! # Checked Mutations
//!
//! Store mutations as the CLI and the HTTP API expose them: ids are
//! resolved ignoring spaces and case, locked courses cannot be completed
//! and rejected selections become errors instead of silent no-ops.

use coursemap_core::{CourseId, CoursemapError, Grade, ProgressStore};
use std::collections::BTreeSet;

/// Resolve a user-typed id (`"me 101"`) to its curriculum id.
pub fn resolve(store: &ProgressStore, raw: &str) -> Result<CourseId, CoursemapError> {
    store
        .curriculum()
        .find_normalized(raw)
        .map(|course| course.id.clone())
        .ok_or_else(|| CoursemapError::CourseNotFound(raw.trim().to_string()))
}

/// Set a course's completion. Returns the resolved id and the courses the
/// change forced back to incomplete.
///
/// A given option counts toward the lock check, so the option's own
/// prerequisites apply. A rejected request leaves the store untouched.
pub fn set_completion(
    store: &mut ProgressStore,
    raw: &str,
    completed: bool,
    grade: Option<Grade>,
    option: Option<usize>,
) -> Result<(CourseId, Vec<CourseId>), CoursemapError> {
    let id = resolve(store, raw)?;

    if let Some(index) = option {
        let options = store
            .curriculum()
            .get(id.as_str())
            .map_or(0, |course| course.options.len());
        if index >= options {
            return Err(CoursemapError::InvalidSelection(format!(
                "{} has no option {}",
                id, index
            )));
        }
    }
    if completed && store.is_locked_with_option(id.as_str(), option) {
        return Err(CoursemapError::CourseLocked(id.to_string()));
    }

    let before: BTreeSet<CourseId> = store.progress().completed_ids().into_iter().collect();
    store.set_completion(id.as_str(), completed, grade, option);
    let invalidated = before
        .into_iter()
        .filter(|c| *c != id && !store.progress().is_completed(c.as_str()))
        .collect();

    Ok((id, invalidated))
}

/// Choose (`Some`) or clear (`None`) an elective option.
pub fn select_option(
    store: &mut ProgressStore,
    raw: &str,
    index: Option<usize>,
) -> Result<CourseId, CoursemapError> {
    let id = resolve(store, raw)?;
    if store.select_option(id.as_str(), index) {
        Ok(id)
    } else {
        Err(CoursemapError::InvalidSelection(format!(
            "{} has no option {}",
            id,
            index.map_or_else(|| "-".to_string(), |i| i.to_string())
        )))
    }
}

/// Choose a value of a completed variable-credit course.
pub fn select_credit(
    store: &mut ProgressStore,
    raw: &str,
    index: usize,
) -> Result<CourseId, CoursemapError> {
    let id = resolve(store, raw)?;
    if store.select_credit(id.as_str(), index) {
        Ok(id)
    } else {
        Err(CoursemapError::InvalidSelection(format!(
            "credit choice {} is not available for {} (course must be completed with variable credits)",
            index, id
        )))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::events::RevisionCounter;
    use coursemap_core::{Curriculum, StorageBackend};
    use std::sync::Arc;

    const ME_CURRICULUM: &str = include_str!("../../../curricula/ME.json");

    fn store() -> ProgressStore {
        ProgressStore::open(
            Curriculum::from_json(ME_CURRICULUM).unwrap(),
            StorageBackend::default(),
        )
    }

    #[test]
    fn resolves_loosely_typed_ids() {
        let store = store();
        assert_eq!(resolve(&store, "math 101").unwrap(), CourseId::new("MATH101"));
        assert!(matches!(
            resolve(&store, "CHEM101"),
            Err(CoursemapError::CourseNotFound(_))
        ));
    }

    #[test]
    fn locked_course_cannot_be_completed() {
        let mut store = store();
        let result = set_completion(&mut store, "MATH102", true, Some(Grade::AA), None);
        assert!(matches!(result, Err(CoursemapError::CourseLocked(_))));
        assert!(!store.progress().is_completed("MATH102"));
    }

    #[test]
    fn uncheck_reports_cascade() {
        let mut store = store();
        set_completion(&mut store, "MATH101", true, Some(Grade::AA), None).unwrap();
        set_completion(&mut store, "MATH102", true, Some(Grade::BB), None).unwrap();

        let (id, invalidated) = set_completion(&mut store, "math101", false, None, None).unwrap();
        assert_eq!(id, CourseId::new("MATH101"));
        assert_eq!(invalidated, vec![CourseId::new("MATH102")]);
    }

    #[test]
    fn option_prerequisites_apply_to_lock_check() {
        let mut store = store();
        // ME410 requires ME202.
        let result = set_completion(&mut store, "REXX6", true, Some(Grade::BB), Some(0));
        assert!(matches!(result, Err(CoursemapError::CourseLocked(_))));

        // ME430 has no prerequisites.
        set_completion(&mut store, "REXX6", true, Some(Grade::BB), Some(2)).unwrap();
        assert!(store.progress().is_passed("REXX6"));
    }

    #[test]
    fn rejected_completion_leaves_store_untouched() {
        let mut store = store();
        let revision = Arc::new(RevisionCounter::new());
        store.subscribe(revision.clone());

        let result = set_completion(&mut store, "REXX6", true, Some(Grade::BB), Some(0));
        assert!(matches!(result, Err(CoursemapError::CourseLocked(_))));
        let result = set_completion(&mut store, "REXX6", true, Some(Grade::BB), Some(9));
        assert!(matches!(result, Err(CoursemapError::InvalidSelection(_))));
        assert!(store.progress().get("REXX6").is_none());
        assert_eq!(revision.current(), 0);

        set_completion(&mut store, "REXX6", true, Some(Grade::BB), Some(2)).unwrap();
        assert_eq!(
            store.progress().get("REXX6").unwrap().selected_option,
            Some(2)
        );
        assert_eq!(revision.current(), 1);
    }

    #[test]
    fn rejected_selections_are_errors() {
        let mut store = store();
        assert!(matches!(
            select_option(&mut store, "REXX1", Some(7)),
            Err(CoursemapError::InvalidSelection(_))
        ));
        assert!(matches!(
            select_credit(&mut store, "ME400", 1),
            Err(CoursemapError::InvalidSelection(_))
        ));
        assert_eq!(
            select_option(&mut store, "rexx1", Some(1)).unwrap(),
            CourseId::new("REXX1")
        );
    }
}
