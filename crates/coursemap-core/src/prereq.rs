//! # Prerequisite Evaluator
//!
//! Lock state, dependents and per-clause status, computed fresh from the
//! curriculum and the current progress on every query.
//!
//! A course's effective clauses are its own clauses followed by those of its
//! selected elective option. Only plain and soft clauses create dependency
//! edges; count-pattern and credit-threshold clauses are re-evaluated on
//! demand and never cascade.

use crate::curriculum::{CountPattern, Curriculum, Prereq};
use crate::metrics::earned_credits;
use crate::types::{CourseId, ProgressMap};
use serde::Serialize;

/// Whether a single clause holds under the current progress.
#[must_use]
pub fn is_satisfied(clause: &Prereq, curriculum: &Curriculum, progress: &ProgressMap) -> bool {
    match clause {
        Prereq::Course { id, .. } => progress.is_passed(id.as_str()),
        Prereq::CountPattern(pattern) => {
            count_matching(pattern, curriculum, progress) >= pattern.min_count
        }
        Prereq::MinCredits(required) => earned_credits(curriculum, progress) >= *required,
    }
}

/// Number of passed curriculum courses counted by a count-pattern clause.
#[must_use]
pub fn count_matching(pattern: &CountPattern, curriculum: &Curriculum, progress: &ProgressMap) -> u32 {
    let count = curriculum
        .courses()
        .iter()
        .filter(|c| pattern.includes(&c.id) && progress.is_passed(c.id.as_str()))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// A course is locked iff at least one effective clause is unsatisfied.
///
/// Unknown ids and courses without clauses are never locked.
#[must_use]
pub fn is_locked(course_id: &str, curriculum: &Curriculum, progress: &ProgressMap) -> bool {
    let Some(course) = curriculum.get(course_id) else {
        return false;
    };
    course
        .effective_prereqs(progress.get(course_id))
        .any(|clause| !is_satisfied(clause, curriculum, progress))
}

/// Courses whose effective plain or soft clauses name `course_id`.
///
/// Returned in curriculum declaration order.
#[must_use]
pub fn find_dependents(course_id: &str, curriculum: &Curriculum, progress: &ProgressMap) -> Vec<CourseId> {
    curriculum
        .courses()
        .iter()
        .filter(|c| c.requires(course_id, progress.get(c.id.as_str())))
        .map(|c| c.id.clone())
        .collect()
}

// =============================================================================
// CLAUSE STATUS
// =============================================================================

/// Evaluation of one effective clause, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClauseStatus {
    Course {
        course_id: CourseId,
        soft: bool,
        satisfied: bool,
    },
    CountPattern {
        pattern: String,
        count: u32,
        min_count: u32,
        message: String,
        satisfied: bool,
    },
    MinCredits {
        earned: u32,
        required: u32,
        satisfied: bool,
    },
}

impl ClauseStatus {
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        match self {
            ClauseStatus::Course { satisfied, .. }
            | ClauseStatus::CountPattern { satisfied, .. }
            | ClauseStatus::MinCredits { satisfied, .. } => *satisfied,
        }
    }
}

/// Status of every effective clause of a course, in clause order.
///
/// Unknown ids yield an empty list.
#[must_use]
pub fn clause_status(course_id: &str, curriculum: &Curriculum, progress: &ProgressMap) -> Vec<ClauseStatus> {
    let Some(course) = curriculum.get(course_id) else {
        return Vec::new();
    };
    course
        .effective_prereqs(progress.get(course_id))
        .map(|clause| match clause {
            Prereq::Course { id, soft } => ClauseStatus::Course {
                course_id: id.clone(),
                soft: *soft,
                satisfied: progress.is_passed(id.as_str()),
            },
            Prereq::CountPattern(pattern) => {
                let count = count_matching(pattern, curriculum, progress);
                ClauseStatus::CountPattern {
                    pattern: pattern.pattern.as_str().to_string(),
                    count,
                    min_count: pattern.min_count,
                    message: pattern.message.clone(),
                    satisfied: count >= pattern.min_count,
                }
            }
            Prereq::MinCredits(required) => {
                let earned = earned_credits(curriculum, progress);
                ClauseStatus::MinCredits {
                    earned,
                    required: *required,
                    satisfied: earned >= *required,
                }
            }
        })
        .collect()
}

// =============================================================================
// RELATED COURSES
// =============================================================================

/// A course counted by a count-pattern clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMember {
    pub course_id: CourseId,
    pub satisfied: bool,
}

/// The neighbourhood of a course in the prerequisite structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RelatedCourses {
    /// Courses named by effective plain/soft clauses.
    pub prerequisites: Vec<CourseId>,
    /// Courses that name this one.
    pub dependents: Vec<CourseId>,
    /// Members of the course's count-pattern clauses.
    pub pattern_members: Vec<PatternMember>,
}

/// Direct prerequisites, direct dependents and count-pattern members.
///
/// `None` for unknown ids.
#[must_use]
pub fn related_courses(
    course_id: &str,
    curriculum: &Curriculum,
    progress: &ProgressMap,
) -> Option<RelatedCourses> {
    let course = curriculum.get(course_id)?;
    let mut related = RelatedCourses {
        dependents: find_dependents(course_id, curriculum, progress),
        ..RelatedCourses::default()
    };

    for clause in course.effective_prereqs(progress.get(course_id)) {
        match clause {
            Prereq::Course { id, .. } => {
                if !related.prerequisites.contains(id) {
                    related.prerequisites.push(id.clone());
                }
            }
            Prereq::CountPattern(pattern) => {
                let members = curriculum
                    .courses()
                    .iter()
                    .filter(|c| c.id != course.id && pattern.includes(&c.id));
                for member in members {
                    if related.pattern_members.iter().all(|m| m.course_id != member.id) {
                        related.pattern_members.push(PatternMember {
                            course_id: member.id.clone(),
                            satisfied: progress.is_passed(member.id.as_str()),
                        });
                    }
                }
            }
            Prereq::MinCredits(_) => {}
        }
    }

    Some(related)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Grade;

    fn curriculum() -> Curriculum {
        Curriculum::from_json(
            r#"{"code":"P","courses":[
                {"id":"PHYS101","term":1,"credits":4},
                {"id":"PHYS102","term":2,"credits":4,"prereqs":["PHYS101"]},
                {"id":"LAB201","term":3,"credits":2,"prereqs":["!PHYS102"]},
                {"id":"SE301","term":5,"credits":3},
                {"id":"SE302","term":5,"credits":3},
                {"id":"SE399","term":6,"credits":3},
                {"id":"SE490","term":7,"credits":3,"prereqs":[
                    {"type":"count_pattern","pattern":"^SE3","exclude":["SE399"],
                     "minCount":2,"message":"two SE3xx courses"}]},
                {"id":"GRAD","term":8,"credits":0,"prereqs":["10 Credits"]},
                {"id":"ELEC","term":6,"credits":3,"options":[
                    {"id":"OPT1","name":"Optics","prereqs":["PHYS102"]}]}
            ]}"#,
        )
        .expect("curriculum")
    }

    fn pass(map: &mut ProgressMap, id: &str, grade: Grade) {
        let entry = map.entry(&CourseId::new(id));
        entry.completed = true;
        entry.grade = Some(grade);
    }

    #[test]
    fn plain_clause_requires_passing_grade() {
        let c = curriculum();
        let mut map = ProgressMap::new();
        assert!(is_locked("PHYS102", &c, &map));

        pass(&mut map, "PHYS101", Grade::FF);
        assert!(is_locked("PHYS102", &c, &map));

        pass(&mut map, "PHYS101", Grade::DD);
        assert!(!is_locked("PHYS102", &c, &map));
    }

    #[test]
    fn soft_clause_behaves_like_plain() {
        let c = curriculum();
        let mut map = ProgressMap::new();
        assert!(is_locked("LAB201", &c, &map));
        pass(&mut map, "PHYS102", Grade::CC);
        assert!(!is_locked("LAB201", &c, &map));
    }

    #[test]
    fn count_pattern_honors_exclusions() {
        let c = curriculum();
        let mut map = ProgressMap::new();
        pass(&mut map, "SE301", Grade::AA);
        pass(&mut map, "SE399", Grade::AA);
        assert!(is_locked("SE490", &c, &map));

        pass(&mut map, "SE302", Grade::BB);
        assert!(!is_locked("SE490", &c, &map));
    }

    #[test]
    fn credit_threshold_uses_earned_credits() {
        let c = curriculum();
        let mut map = ProgressMap::new();
        pass(&mut map, "PHYS101", Grade::AA);
        pass(&mut map, "PHYS102", Grade::AA);
        assert!(is_locked("GRAD", &c, &map));

        pass(&mut map, "SE301", Grade::CC);
        assert!(!is_locked("GRAD", &c, &map));
    }

    #[test]
    fn unknown_and_clauseless_courses_are_unlocked() {
        let c = curriculum();
        let map = ProgressMap::new();
        assert!(!is_locked("PHYS101", &c, &map));
        assert!(!is_locked("NOPE", &c, &map));
    }

    #[test]
    fn selected_option_adds_clauses() {
        let c = curriculum();
        let mut map = ProgressMap::new();
        assert!(!is_locked("ELEC", &c, &map));
        assert!(!find_dependents("PHYS102", &c, &map).contains(&CourseId::new("ELEC")));

        map.entry(&CourseId::new("ELEC")).selected_option = Some(0);
        assert!(is_locked("ELEC", &c, &map));
        assert!(find_dependents("PHYS102", &c, &map).contains(&CourseId::new("ELEC")));
    }

    #[test]
    fn dependents_strip_soft_marker_and_skip_patterns() {
        let c = curriculum();
        let map = ProgressMap::new();
        assert_eq!(find_dependents("PHYS102", &c, &map), vec![CourseId::new("LAB201")]);
        assert!(find_dependents("SE301", &c, &map).is_empty());
    }

    #[test]
    fn clause_status_reports_counts() {
        let c = curriculum();
        let mut map = ProgressMap::new();
        pass(&mut map, "SE301", Grade::BA);

        let status = clause_status("SE490", &c, &map);
        assert_eq!(status.len(), 1);
        assert!(matches!(
            &status[0],
            ClauseStatus::CountPattern { count: 1, min_count: 2, satisfied: false, .. }
        ));

        let grad = clause_status("GRAD", &c, &map);
        assert_eq!(
            grad,
            vec![ClauseStatus::MinCredits { earned: 3, required: 10, satisfied: false }]
        );
    }

    #[test]
    fn related_courses_lists_neighbourhood() {
        let c = curriculum();
        let mut map = ProgressMap::new();
        pass(&mut map, "SE302", Grade::AA);

        let related = related_courses("PHYS102", &c, &map).expect("known course");
        assert_eq!(related.prerequisites, vec![CourseId::new("PHYS101")]);
        assert_eq!(related.dependents, vec![CourseId::new("LAB201")]);

        let pattern = related_courses("SE490", &c, &map).expect("known course");
        let members: Vec<(&str, bool)> = pattern
            .pattern_members
            .iter()
            .map(|m| (m.course_id.as_str(), m.satisfied))
            .collect();
        assert_eq!(members, vec![("SE301", false), ("SE302", true)]);

        assert!(related_courses("NOPE", &c, &map).is_none());
    }

    #[test]
    fn pattern_members_exclude_the_course_itself() {
        let c = Curriculum::from_json(
            r#"{"code":"P","courses":[
                {"id":"SE301","term":5,"credits":3},
                {"id":"SE350","term":6,"credits":3,"prereqs":[
                    {"type":"count_pattern","pattern":"^SE3","minCount":1,"message":"one SE3xx course"}]}
            ]}"#,
        )
        .expect("curriculum");

        let related = related_courses("SE350", &c, &ProgressMap::new()).expect("known course");
        let members: Vec<&str> = related
            .pattern_members
            .iter()
            .map(|m| m.course_id.as_str())
            .collect();
        assert_eq!(members, vec!["SE301"]);
    }
}
