//! # Progress Observers
//!
//! Observers the application subscribes to every [`ProgressStore`].
//!
//! [`ProgressStore`]: coursemap_core::ProgressStore

use coursemap_core::{ChangeKind, ProgressEvent, ProgressObserver};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts store changes. Clients poll it to detect stale views.
#[derive(Debug, Default)]
pub struct RevisionCounter {
    revision: AtomicU64,
}

impl RevisionCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of changes observed so far.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

impl ProgressObserver for RevisionCounter {
    fn on_change(&self, _event: &ProgressEvent) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }
}

/// Writes one structured log line per change.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_change(&self, event: &ProgressEvent) {
        match &event.kind {
            ChangeKind::Completion {
                course_id,
                completed,
                invalidated,
            } => {
                tracing::info!(
                    department = %event.department,
                    course = %course_id,
                    completed,
                    invalidated = invalidated.len(),
                    "Completion changed"
                );
            }
            ChangeKind::Imported { courses } | ChangeKind::SimulationApplied { courses } => {
                tracing::info!(
                    department = %event.department,
                    courses,
                    kind = ?event.kind,
                    "Batch applied"
                );
            }
            kind => {
                tracing::debug!(department = %event.department, ?kind, "Progress changed");
            }
        }
    }
}
