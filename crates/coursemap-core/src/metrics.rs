//! # Metrics Calculator
//!
//! Earned credits and grade point average over the current progress.
//!
//! All sums are integer: grade points are hundredths, so a weighted sum is
//! `credits × hundredths` and the average is rounded half-up back into
//! hundredths. Entries for ids that are not in the curriculum are ignored.

use crate::curriculum::Curriculum;
use crate::types::{Gpa, ProgressEntry, ProgressMap};
use serde::{Deserialize, Serialize};

/// Aggregate figures for one progress map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metrics {
    /// Credits of completed courses with a passing grade.
    pub earned_credits: u32,
    /// Credits that enter the GPA denominator (passing and failing).
    pub graded_credits: u32,
    /// Number of completed courses.
    pub completed_courses: usize,
    /// Weighted grade point average.
    pub gpa: Gpa,
}

/// Weighted grade totals: `points` is `Σ credits × hundredths`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GradeTotals {
    pub points: u64,
    pub credits: u32,
}

impl GradeTotals {
    /// Add one graded course.
    pub fn add(&mut self, credits: u32, hundredths: u32) {
        self.points = self
            .points
            .saturating_add(u64::from(credits) * u64::from(hundredths));
        self.credits = self.credits.saturating_add(credits);
    }

    /// The average, rounded half-up. Zero credits give [`Gpa::ZERO`].
    #[must_use]
    pub fn gpa(&self) -> Gpa {
        average(self.points, u64::from(self.credits))
    }
}

/// `points / credits` in hundredths, rounded half-up.
#[must_use]
pub fn average(points: u64, credits: u64) -> Gpa {
    if credits == 0 {
        return Gpa::ZERO;
    }
    let rounded = (points + credits / 2) / credits;
    Gpa::from_hundredths(u32::try_from(rounded).unwrap_or(u32::MAX))
}

/// Compute all metrics for a progress map.
#[must_use]
pub fn calculate_metrics(curriculum: &Curriculum, progress: &ProgressMap) -> Metrics {
    let totals = graded_totals(curriculum, progress, |_| true);
    let completed_courses = curriculum
        .courses()
        .iter()
        .filter(|c| progress.is_completed(c.id.as_str()))
        .count();

    Metrics {
        earned_credits: earned_credits(curriculum, progress),
        graded_credits: totals.credits,
        completed_courses,
        gpa: totals.gpa(),
    }
}

/// Sum of effective credits over completed courses with a passing grade.
#[must_use]
pub fn earned_credits(curriculum: &Curriculum, progress: &ProgressMap) -> u32 {
    curriculum
        .courses()
        .iter()
        .filter_map(|course| {
            let entry = progress.get(course.id.as_str())?;
            entry
                .is_passed()
                .then(|| course.effective_credits(Some(entry)))
        })
        .fold(0u32, u32::saturating_add)
}

/// Weighted totals over completed, graded courses accepted by `filter`.
pub fn graded_totals(
    curriculum: &Curriculum,
    progress: &ProgressMap,
    filter: impl Fn(&ProgressEntry) -> bool,
) -> GradeTotals {
    let mut totals = GradeTotals::default();
    for course in curriculum.courses() {
        let Some(entry) = progress.get(course.id.as_str()) else {
            continue;
        };
        if let Some(grade) = entry.grade
            && entry.completed
            && filter(entry)
        {
            totals.add(course.effective_credits(Some(entry)), grade.points());
        }
    }
    totals
}
