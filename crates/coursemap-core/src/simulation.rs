//! # Simulation Solver
//!
//! Back-fills plausible grades for upcoming courses so that the overall GPA
//! lands near a target.
//!
//! The solver is greedy: each candidate course takes the grade nearest to the
//! average still required over the credits that remain, so the last course
//! absorbs whatever rounding the earlier picks left behind. All arithmetic is
//! integer (points are `credits × hundredths`).

use crate::curriculum::Curriculum;
use crate::metrics::{GradeTotals, average, graded_totals};
use crate::prereq::is_locked;
use crate::types::{CourseId, Gpa, Grade, ProgressMap};
use serde::Serialize;
use thiserror::Error;

/// Errors raised before or during a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// Target outside 0.00–4.00, or not a number.
    #[error("Target GPA must be between 0.00 and 4.00, got {0}")]
    InvalidTarget(String),

    /// Course count zero or negative.
    #[error("Course count must be positive, got {0}")]
    InvalidCount(i64),

    /// No incomplete, unlocked course is left to simulate.
    #[error("No eligible courses to simulate")]
    NoCandidates,
}

/// A validated simulation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationRequest {
    target: Gpa,
    count: usize,
}

impl SimulationRequest {
    /// Validate a target and a course count.
    pub fn new(target: Gpa, count: i64) -> Result<Self, SimulationError> {
        if target > Gpa::MAX {
            return Err(SimulationError::InvalidTarget(target.to_string()));
        }
        let count = usize::try_from(count)
            .ok()
            .filter(|c| *c > 0)
            .ok_or(SimulationError::InvalidCount(count))?;
        Ok(Self { target, count })
    }

    /// Validate a textual target (`"3.25"`).
    pub fn parse(target: &str, count: i64) -> Result<Self, SimulationError> {
        let target = target
            .parse::<Gpa>()
            .map_err(|_| SimulationError::InvalidTarget(target.trim().to_string()))?;
        Self::new(target, count)
    }

    #[must_use]
    pub fn target(&self) -> Gpa {
        self.target
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

/// A course eligible for a simulated grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationCandidate {
    pub course_id: CourseId,
    pub term: u8,
    pub credits: u32,
}

/// Selected candidates plus the real graded history they build on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimulationCandidates {
    pub courses: Vec<SimulationCandidate>,
    pub current: GradeTotals,
}

/// One assigned grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatedGrade {
    pub course_id: CourseId,
    pub credits: u32,
    pub grade: Grade,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub target: Gpa,
    pub grades: Vec<SimulatedGrade>,
    /// GPA over real history plus the simulated grades.
    pub projected: Gpa,
}

/// Up to `count` incomplete, unlocked courses, ordered by term then
/// declaration order.
///
/// Current totals cover completed, graded entries not produced by a
/// simulation.
#[must_use]
pub fn simulation_candidates(
    curriculum: &Curriculum,
    progress: &ProgressMap,
    count: usize,
) -> SimulationCandidates {
    let mut eligible: Vec<_> = curriculum
        .courses()
        .iter()
        .filter(|c| !progress.is_completed(c.id.as_str()))
        .filter(|c| !is_locked(c.id.as_str(), curriculum, progress))
        .collect();
    eligible.sort_by_key(|c| c.term);

    let courses = eligible
        .into_iter()
        .take(count)
        .map(|c| SimulationCandidate {
            course_id: c.id.clone(),
            term: c.term,
            credits: c.effective_credits(progress.get(c.id.as_str())),
        })
        .collect();

    SimulationCandidates {
        courses,
        current: graded_totals(curriculum, progress, |e| !e.is_simulation),
    }
}

/// Assign a grade to every candidate, converging on `target`.
#[must_use]
pub fn assign_grades(candidates: &SimulationCandidates, target: Gpa) -> Vec<SimulatedGrade> {
    let target = i128::from(target.hundredths());
    let planned: i128 = candidates
        .courses
        .iter()
        .map(|c| i128::from(c.credits))
        .sum();
    let total = planned + i128::from(candidates.current.credits);

    let mut remaining_points = target * total - i128::from(candidates.current.points);
    let mut remaining_credits = planned;
    let mut grades = Vec::with_capacity(candidates.courses.len());

    for course in &candidates.courses {
        let credits = i128::from(course.credits);
        let grade = if credits == 0 {
            nearest_grade(target, 1)
        } else {
            nearest_grade(remaining_points, remaining_credits)
        };
        remaining_points -= credits * i128::from(grade.points());
        remaining_credits -= credits;

        grades.push(SimulatedGrade {
            course_id: course.course_id.clone(),
            credits: course.credits,
            grade,
        });
    }

    grades
}

/// GPA over the current totals plus a set of simulated grades.
#[must_use]
pub fn projected_gpa(candidates: &SimulationCandidates, grades: &[SimulatedGrade]) -> Gpa {
    let mut totals = candidates.current;
    for g in grades {
        totals.add(g.credits, g.grade.points());
    }
    average(totals.points, u64::from(totals.credits))
}

/// Grade nearest to `points / credits` hundredths; ties go to the higher grade.
fn nearest_grade(points: i128, credits: i128) -> Grade {
    Grade::ALL
        .into_iter()
        .min_by_key(|g| (i128::from(g.points()) * credits - points).abs())
        .unwrap_or(Grade::FF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(credits: &[u32], current: GradeTotals) -> SimulationCandidates {
        SimulationCandidates {
            courses: credits
                .iter()
                .enumerate()
                .map(|(i, c)| SimulationCandidate {
                    course_id: CourseId::new(format!("C{i}")),
                    term: 1,
                    credits: *c,
                })
                .collect(),
            current,
        }
    }

    #[test]
    fn request_validation() {
        assert!(SimulationRequest::new(Gpa(400), 1).is_ok());
        assert!(SimulationRequest::new(Gpa::ZERO, 1).is_ok());
        assert_eq!(
            SimulationRequest::new(Gpa(401), 3),
            Err(SimulationError::InvalidTarget("4.01".to_string()))
        );
        assert_eq!(
            SimulationRequest::new(Gpa(300), 0),
            Err(SimulationError::InvalidCount(0))
        );
        assert_eq!(
            SimulationRequest::new(Gpa(300), -2),
            Err(SimulationError::InvalidCount(-2))
        );
        assert!(matches!(
            SimulationRequest::parse("abc", 3),
            Err(SimulationError::InvalidTarget(_))
        ));
        assert!(matches!(
            SimulationRequest::parse("-1", 3),
            Err(SimulationError::InvalidTarget(_))
        ));
    }

    #[test]
    fn converges_exactly_when_reachable() {
        let c = candidates(&[3, 3, 3], GradeTotals::default());
        let grades = assign_grades(&c, Gpa(300));
        assert!(grades.iter().all(|g| g.grade == Grade::BB));
        assert_eq!(projected_gpa(&c, &grades), Gpa(300));
    }

    #[test]
    fn compensates_for_history() {
        let mut history = GradeTotals::default();
        history.add(4, Grade::AA.points());
        let c = candidates(&[4, 4], history);

        let grades = assign_grades(&c, Gpa(300));
        assert_eq!(grades[0].grade, Grade::CB);
        assert_eq!(grades[1].grade, Grade::CB);
        assert_eq!(projected_gpa(&c, &grades), Gpa(300));
    }

    #[test]
    fn last_course_absorbs_rounding() {
        let c = candidates(&[3, 3, 3], GradeTotals::default());
        let grades = assign_grades(&c, Gpa(320));
        let picked: Vec<Grade> = grades.iter().map(|g| g.grade).collect();
        assert_eq!(picked, vec![Grade::BB, Grade::BA, Grade::BB]);
        assert!(projected_gpa(&c, &grades).distance(Gpa(320)) <= 5);
    }

    #[test]
    fn clamps_to_scale() {
        let mut history = GradeTotals::default();
        history.add(10, Grade::FF.points());
        let c = candidates(&[2], history);
        let grades = assign_grades(&c, Gpa(400));
        assert_eq!(grades[0].grade, Grade::AA);
    }

    #[test]
    fn zero_credit_course_takes_target_grade() {
        let c = candidates(&[0, 3], GradeTotals::default());
        let grades = assign_grades(&c, Gpa(260));
        assert_eq!(grades[0].grade, Grade::CB);
        assert_eq!(grades[1].grade, Grade::CB);
    }
}
