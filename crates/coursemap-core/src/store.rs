//! # Progress Store
//!
//! The single owner of a department's progress map.
//!
//! Every change goes through a store method: the store updates the map,
//! cascades invalidation to dependents on uncheck, persists the map through
//! its [`StorageBackend`] and notifies observers exactly once per call.
//!
//! ## Simulation Mode
//!
//! [`ProgressStore::enter_simulation`] sets the real map aside and lets the
//! live map diverge. Nothing is persisted while simulating;
//! [`ProgressStore::exit_simulation`] restores the real map.
//!
//! ## Locks
//!
//! The store does not refuse to complete a locked course. Callers that want
//! that guarantee check [`ProgressStore::is_locked`] first.

use crate::curriculum::Curriculum;
use crate::formats::{progress_from_json, progress_to_json};
use crate::metrics::{Metrics, calculate_metrics};
use crate::prereq::{find_dependents, is_locked};
use crate::simulation::{
    SimulationError, SimulationReport, SimulationRequest, assign_grades, projected_gpa,
    simulation_candidates,
};
use crate::storage::{KeyValueStore, StorageBackend};
use crate::transcript::{ImportError, ImportPlan, ImportSummary, TranscriptRow, match_transcript};
use crate::types::{CourseId, Grade, ProgressMap};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

// =============================================================================
// CHANGE NOTIFICATION
// =============================================================================

/// What a store call changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    Completion {
        course_id: CourseId,
        completed: bool,
        invalidated: Vec<CourseId>,
    },
    OptionSelected {
        course_id: CourseId,
    },
    CreditSelected {
        course_id: CourseId,
    },
    Reset,
    DepartmentSwitched,
    SimulationEntered,
    SimulationExited,
    SimulationApplied {
        courses: usize,
    },
    Imported {
        courses: usize,
    },
}

/// Notification sent to observers after a store call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub department: String,
    pub kind: ChangeKind,
}

/// Receives one event per state-changing store call.
pub trait ProgressObserver: Send + Sync {
    fn on_change(&self, event: &ProgressEvent);
}

// =============================================================================
// STORE
// =============================================================================

/// Progress of one department, bound to its curriculum and storage.
pub struct ProgressStore {
    curriculum: Curriculum,
    backend: StorageBackend,
    progress: ProgressMap,
    /// Real map set aside while simulation mode is active.
    saved: Option<ProgressMap>,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("department", &self.curriculum.code())
            .field("entries", &self.progress.len())
            .field("simulation", &self.saved.is_some())
            .field("persistent", &self.backend.is_persistent())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ProgressStore {
    /// Bind a curriculum to a backend and load its saved progress.
    ///
    /// Unreadable or malformed saved progress yields an empty map.
    #[must_use]
    pub fn open(curriculum: Curriculum, backend: StorageBackend) -> Self {
        let progress = load_progress(&backend, curriculum.code());
        info!(
            department = curriculum.code(),
            entries = progress.len(),
            persistent = backend.is_persistent(),
            "Progress store opened"
        );
        Self {
            curriculum,
            backend,
            progress,
            saved: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer for every subsequent change.
    pub fn subscribe(&mut self, observer: Arc<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// The active department code.
    #[must_use]
    pub fn department(&self) -> &str {
        self.curriculum.code()
    }

    /// The live progress map (simulated entries included).
    #[must_use]
    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    /// The real map set aside by simulation mode, if active.
    #[must_use]
    pub fn saved_progress(&self) -> Option<&ProgressMap> {
        self.saved.as_ref()
    }

    #[must_use]
    pub fn is_simulation(&self) -> bool {
        self.saved.is_some()
    }

    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    #[must_use]
    pub fn is_locked(&self, course_id: &str) -> bool {
        is_locked(course_id, &self.curriculum, &self.progress)
    }

    /// Whether the course would be locked with elective option `option`
    /// selected. `None` keeps the current selection. Nothing is changed.
    #[must_use]
    pub fn is_locked_with_option(&self, course_id: &str, option: Option<usize>) -> bool {
        let (Some(index), Some(course)) = (option, self.curriculum.get(course_id)) else {
            return self.is_locked(course_id);
        };
        let mut scratch = self.progress.clone();
        scratch.entry(&course.id).selected_option = Some(index);
        is_locked(course_id, &self.curriculum, &scratch)
    }

    #[must_use]
    pub fn metrics(&self) -> Metrics {
        calculate_metrics(&self.curriculum, &self.progress)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Mark a course completed or not, optionally setting grade and option.
    ///
    /// Unknown ids are ignored without notification. Completing a course
    /// with no grade (none given, none stored) leaves it incomplete.
    /// Unchecking cascades to every completed dependent.
    pub fn set_completion(
        &mut self,
        course_id: &str,
        completed: bool,
        grade: Option<Grade>,
        selected_option: Option<usize>,
    ) {
        let Some(course) = self.curriculum.get(course_id) else {
            debug!(course = course_id, "Ignoring mutation of unknown course");
            return;
        };
        let id = course.id.clone();

        let invalidated = self.apply_completion(&id, completed, grade, selected_option);
        let completed = self.progress.is_completed(id.as_str());
        debug!(course = %id, completed, invalidated = invalidated.len(), "Completion updated");

        self.persist();
        self.notify(ChangeKind::Completion {
            course_id: id,
            completed,
            invalidated,
        });
    }

    /// Force every completed dependent of `course_id` (transitively) back to
    /// incomplete and ungraded. Returns the invalidated ids in visit order.
    ///
    /// Each course is visited at most once, so cyclic prerequisites
    /// terminate.
    pub fn cascade_uncheck(&mut self, course_id: &str) -> Vec<CourseId> {
        let simulating = self.saved.is_some();
        let mut visited = BTreeSet::from([CourseId::new(course_id)]);
        let mut pending = VecDeque::from([CourseId::new(course_id)]);
        let mut invalidated = Vec::new();

        while let Some(current) = pending.pop_front() {
            for dependent in find_dependents(current.as_str(), &self.curriculum, &self.progress) {
                if !visited.insert(dependent.clone()) {
                    continue;
                }
                let Some(entry) = self.progress.get_mut(dependent.as_str()) else {
                    continue;
                };
                if !entry.completed {
                    continue;
                }
                entry.invalidate();
                if simulating {
                    entry.is_simulation = false;
                }
                debug!(course = %dependent, cause = %current, "Cascade uncheck");
                invalidated.push(dependent.clone());
                pending.push_back(dependent);
            }
        }

        invalidated
    }

    /// Choose (`Some`) or clear (`None`) a course's elective option.
    ///
    /// Returns `false` for unknown courses and out-of-range indices.
    pub fn select_option(&mut self, course_id: &str, index: Option<usize>) -> bool {
        let Some(course) = self.curriculum.get(course_id) else {
            return false;
        };
        if index.is_some_and(|i| i >= course.options.len()) {
            return false;
        }
        let id = course.id.clone();

        let entry = self.progress.entry(&id);
        if entry.selected_option != index {
            entry.selected_option = index;
            entry.selected_credit_index = None;
        }

        self.persist();
        self.notify(ChangeKind::OptionSelected { course_id: id });
        true
    }

    /// Choose a value of a variable-credit course.
    ///
    /// Only honored while the course is completed and the index names one
    /// of its credit choices.
    pub fn select_credit(&mut self, course_id: &str, index: usize) -> bool {
        let Some(course) = self.curriculum.get(course_id) else {
            return false;
        };
        let entry = self.progress.get(course_id);
        let credits = course.effective_credit_options(entry);
        let completed = entry.is_some_and(|e| e.completed);
        if !completed || !credits.is_variable() || index >= credits.choices() {
            return false;
        }
        let id = course.id.clone();

        self.progress.entry(&id).selected_credit_index = Some(index);

        self.persist();
        self.notify(ChangeKind::CreditSelected { course_id: id });
        true
    }

    /// Clear the live progress map.
    pub fn reset(&mut self) {
        self.progress.clear();
        info!(department = self.department(), "Progress reset");
        self.persist();
        self.notify(ChangeKind::Reset);
    }

    /// Activate another department: leave simulation mode and load its
    /// saved progress.
    pub fn switch_department(&mut self, curriculum: Curriculum) {
        self.saved = None;
        self.progress = load_progress(&self.backend, curriculum.code());
        self.curriculum = curriculum;
        info!(department = self.department(), entries = self.progress.len(), "Department switched");
        self.notify(ChangeKind::DepartmentSwitched);
    }

    // -------------------------------------------------------------------------
    // Simulation
    // -------------------------------------------------------------------------

    /// Set the real map aside. Returns `false` if already simulating.
    pub fn enter_simulation(&mut self) -> bool {
        if self.saved.is_some() {
            return false;
        }
        self.saved = Some(self.progress.clone());
        self.notify(ChangeKind::SimulationEntered);
        true
    }

    /// Restore the real map, discarding simulated changes. Returns `false`
    /// if not simulating.
    pub fn exit_simulation(&mut self) -> bool {
        let Some(saved) = self.saved.take() else {
            return false;
        };
        self.progress = saved;
        self.notify(ChangeKind::SimulationExited);
        true
    }

    /// Fill upcoming courses with grades converging on the request's target.
    ///
    /// Enters simulation mode if needed. Each run starts over from the real
    /// map, replacing the grades of any earlier run. Nothing changes when no
    /// course is eligible.
    pub fn run_simulation(
        &mut self,
        request: SimulationRequest,
    ) -> Result<SimulationReport, SimulationError> {
        let real = self.saved.as_ref().unwrap_or(&self.progress);
        let candidates = simulation_candidates(&self.curriculum, real, request.count());
        if candidates.courses.is_empty() {
            return Err(SimulationError::NoCandidates);
        }

        let grades = assign_grades(&candidates, request.target());
        let projected = projected_gpa(&candidates, &grades);

        match &self.saved {
            Some(saved) => self.progress = saved.clone(),
            None => self.saved = Some(self.progress.clone()),
        }
        for simulated in &grades {
            self.apply_completion(&simulated.course_id, true, Some(simulated.grade), None);
        }
        info!(
            department = self.department(),
            courses = grades.len(),
            target = %request.target(),
            projected = %projected,
            "Simulation applied"
        );

        self.notify(ChangeKind::SimulationApplied {
            courses: grades.len(),
        });
        Ok(SimulationReport {
            target: request.target(),
            grades,
            projected,
        })
    }

    // -------------------------------------------------------------------------
    // Transcript import
    // -------------------------------------------------------------------------

    /// Replace progress with a resolved transcript plan.
    ///
    /// Leaves simulation mode first, persists once and notifies once.
    pub fn apply_import(&mut self, plan: &ImportPlan) -> ImportSummary {
        self.saved = None;
        self.progress.clear();
        for assignment in &plan.assignments {
            self.apply_completion(
                &assignment.course_id,
                true,
                Some(assignment.grade),
                assignment.option,
            );
        }

        let summary = plan.summary();
        info!(
            department = self.department(),
            matched = summary.matched,
            unmatched = summary.unmatched,
            skipped = summary.skipped,
            rejected = summary.rejected,
            "Transcript imported"
        );

        self.persist();
        self.notify(ChangeKind::Imported {
            courses: summary.matched,
        });
        summary
    }

    /// Match transcript rows and apply the result.
    ///
    /// On error nothing changes.
    pub fn import_rows(&mut self, rows: &[TranscriptRow]) -> Result<ImportSummary, ImportError> {
        let plan = match_transcript(&self.curriculum, rows)?;
        Ok(self.apply_import(&plan))
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Update one entry without persisting or notifying.
    fn apply_completion(
        &mut self,
        id: &CourseId,
        completed: bool,
        grade: Option<Grade>,
        selected_option: Option<usize>,
    ) -> Vec<CourseId> {
        let option_count = self
            .curriculum
            .get(id.as_str())
            .map_or(0, |c| c.options.len());
        let simulating = self.saved.is_some();

        let entry = self.progress.entry(id);
        if let Some(grade) = grade {
            entry.grade = Some(grade);
        }
        if let Some(index) = selected_option.filter(|i| *i < option_count) {
            if entry.selected_option != Some(index) {
                entry.selected_option = Some(index);
                entry.selected_credit_index = None;
            }
        }
        entry.completed = completed && entry.grade.is_some();
        if simulating {
            entry.is_simulation = entry.completed;
        }
        if entry.completed {
            return Vec::new();
        }

        entry.selected_credit_index = None;
        self.cascade_uncheck(id.as_str())
    }

    fn persist(&mut self) {
        if self.saved.is_some() {
            return;
        }
        let code = self.curriculum.code();
        let result = progress_to_json(&self.progress).and_then(|json| self.backend.set(code, &json));
        if let Err(e) = result {
            warn!(department = code, error = %e, "Failed to persist progress");
        }
    }

    fn notify(&self, kind: ChangeKind) {
        if self.observers.is_empty() {
            return;
        }
        let event = ProgressEvent {
            department: self.curriculum.code().to_string(),
            kind,
        };
        for observer in &self.observers {
            observer.on_change(&event);
        }
    }
}

/// Read and normalize a department's saved map.
fn load_progress(backend: &StorageBackend, department: &str) -> ProgressMap {
    let json = match backend.get(department) {
        Ok(Some(json)) => json,
        Ok(None) => return ProgressMap::new(),
        Err(e) => {
            warn!(department, error = %e, "Failed to read saved progress");
            return ProgressMap::new();
        }
    };

    match progress_from_json(&json) {
        Ok(mut progress) => {
            for (_, entry) in progress.iter_mut() {
                entry.is_simulation = false;
                if entry.completed && entry.grade.is_none() {
                    entry.completed = false;
                }
                if !entry.completed {
                    entry.selected_credit_index = None;
                }
            }
            progress
        }
        Err(e) => {
            warn!(department, error = %e, "Discarding malformed saved progress");
            ProgressMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::Gpa;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressEvent>>);

    impl Recorder {
        fn kinds(&self) -> Vec<ChangeKind> {
            self.0
                .lock()
                .expect("lock")
                .iter()
                .map(|e| e.kind.clone())
                .collect()
        }
    }

    impl ProgressObserver for Recorder {
        fn on_change(&self, event: &ProgressEvent) {
            self.0.lock().expect("lock").push(event.clone());
        }
    }

    const CURRICULUM: &str = r#"{"code":"T","courses":[
        {"id":"A","term":1,"credits":3},
        {"id":"B","term":2,"credits":3,"prereqs":["A"]},
        {"id":"C","term":3,"credits":3,"prereqs":["!B"]},
        {"id":"D","term":1,"credits":[1,2]},
        {"id":"S","term":4,"credits":3,"options":[{"id":"O1"},{"id":"O2","credits":[4,6]}]}
    ]}"#;

    fn store_with(backend: StorageBackend) -> (ProgressStore, Arc<Recorder>) {
        let curriculum = Curriculum::from_json(CURRICULUM).expect("curriculum");
        let mut store = ProgressStore::open(curriculum, backend);
        let recorder = Arc::new(Recorder::default());
        store.subscribe(recorder.clone());
        (store, recorder)
    }

    fn store() -> (ProgressStore, Arc<Recorder>) {
        store_with(StorageBackend::default())
    }

    fn saved(store: &ProgressStore) -> Option<String> {
        store.backend().get("T").expect("get")
    }

    #[test]
    fn unknown_course_is_noop() {
        let (mut store, events) = store();
        store.set_completion("NOPE", true, Some(Grade::AA), None);
        assert!(store.progress().is_empty());
        assert!(events.kinds().is_empty());
        assert_eq!(saved(&store), None);
    }

    #[test]
    fn completion_requires_a_grade() {
        let (mut store, events) = store();
        store.set_completion("A", true, None, None);
        assert!(!store.progress().is_completed("A"));
        assert_eq!(events.kinds().len(), 1);

        store.set_completion("A", true, Some(Grade::BA), None);
        store.set_completion("A", false, None, None);
        store.set_completion("A", true, None, None);
        let entry = store.progress().get("A").expect("entry");
        assert!(entry.completed);
        assert_eq!(entry.grade, Some(Grade::BA));
    }

    #[test]
    fn uncheck_cascades_transitively() {
        let (mut store, events) = store();
        store.set_completion("A", true, Some(Grade::AA), None);
        store.set_completion("B", true, Some(Grade::BB), None);
        store.set_completion("C", true, Some(Grade::CC), None);

        store.set_completion("A", false, None, None);

        for id in ["B", "C"] {
            let entry = store.progress().get(id).expect("entry");
            assert!(!entry.completed);
            assert_eq!(entry.grade, None);
        }
        assert_eq!(
            events.kinds().last(),
            Some(&ChangeKind::Completion {
                course_id: CourseId::new("A"),
                completed: false,
                invalidated: vec![CourseId::new("B"), CourseId::new("C")],
            })
        );
    }

    #[test]
    fn cascade_is_idempotent() {
        let (mut store, _) = store();
        store.set_completion("A", true, Some(Grade::AA), None);
        store.set_completion("B", true, Some(Grade::BB), None);
        store.set_completion("A", false, None, None);
        let once = store.progress().clone();

        assert!(store.cascade_uncheck("A").is_empty());
        assert_eq!(store.progress(), &once);
    }

    #[test]
    fn invalid_option_index_is_ignored() {
        let (mut store, _) = store();
        store.set_completion("S", true, Some(Grade::AA), Some(7));
        let entry = store.progress().get("S").expect("entry");
        assert!(entry.completed);
        assert_eq!(entry.selected_option, None);

        assert!(!store.select_option("S", Some(2)));
        assert!(store.select_option("S", Some(1)));
        assert_eq!(store.progress().get("S").expect("entry").selected_option, Some(1));
        assert!(store.select_option("S", None));
        assert_eq!(store.progress().get("S").expect("entry").selected_option, None);
    }

    #[test]
    fn lock_check_with_option_changes_nothing() {
        let curriculum = Curriculum::from_json(
            r#"{"code":"T","courses":[
                {"id":"A","term":1,"credits":3},
                {"id":"E","term":2,"credits":3,"options":[{"id":"E1","prereqs":["A"]},{"id":"E2"}]}
            ]}"#,
        )
        .expect("curriculum");
        let mut store = ProgressStore::open(curriculum, StorageBackend::default());
        let events = Arc::new(Recorder::default());
        store.subscribe(events.clone());

        assert!(!store.is_locked("E"));
        assert!(store.is_locked_with_option("E", Some(0)));
        assert!(!store.is_locked_with_option("E", Some(1)));
        assert!(!store.is_locked_with_option("E", None));
        assert!(store.progress().get("E").is_none());
        assert!(events.kinds().is_empty());

        store.set_completion("A", true, Some(Grade::AA), None);
        assert!(!store.is_locked_with_option("E", Some(0)));
    }

    #[test]
    fn credit_selection_needs_completion() {
        let (mut store, _) = store();
        assert!(!store.select_credit("D", 1));

        store.set_completion("D", true, Some(Grade::AA), None);
        assert!(store.select_credit("D", 1));
        assert!(!store.select_credit("D", 2));
        assert!(!store.select_credit("A", 0));
        assert_eq!(store.metrics().earned_credits, 2);

        store.set_completion("D", false, None, None);
        assert_eq!(store.progress().get("D").expect("entry").selected_credit_index, None);
    }

    #[test]
    fn option_credits_are_selectable() {
        let (mut store, _) = store();
        store.set_completion("S", true, Some(Grade::BB), Some(1));
        assert!(store.select_credit("S", 1));
        assert_eq!(store.metrics().earned_credits, 6);
    }

    #[test]
    fn every_mutation_persists_and_notifies_once() {
        let (mut store, events) = store();
        store.set_completion("A", true, Some(Grade::AA), None);
        assert_eq!(events.kinds().len(), 1);
        assert_eq!(
            saved(&store).as_deref(),
            Some(r#"{"A":{"completed":true,"grade":"AA"}}"#)
        );

        store.reset();
        assert_eq!(events.kinds().len(), 2);
        assert_eq!(saved(&store).as_deref(), Some("{}"));
    }

    #[test]
    fn simulation_is_not_persisted_and_restores() {
        let (mut store, events) = store();
        store.set_completion("A", true, Some(Grade::AA), None);
        let before = saved(&store);

        assert!(store.enter_simulation());
        assert!(!store.enter_simulation());
        store.set_completion("B", true, Some(Grade::CC), None);
        assert!(store.progress().get("B").expect("entry").is_simulation);
        assert_eq!(saved(&store), before);

        assert!(store.exit_simulation());
        assert!(!store.exit_simulation());
        assert!(!store.progress().is_completed("B"));
        assert!(store.progress().is_completed("A"));
        assert!(events.kinds().contains(&ChangeKind::SimulationExited));
    }

    #[test]
    fn run_simulation_applies_and_notifies_once() {
        let (mut store, events) = store();
        store.set_completion("A", true, Some(Grade::BB), None);
        let request = SimulationRequest::new(Gpa(300), 2).expect("request");

        let report = store.run_simulation(request).expect("simulation");
        assert!(store.is_simulation());
        assert_eq!(report.grades.len(), 2);
        assert_eq!(events.kinds().len(), 2);
        assert!(report.grades.iter().all(|g| store.progress().is_completed(g.course_id.as_str())));

        // persisted map still holds only the real completion
        assert_eq!(
            saved(&store).as_deref(),
            Some(r#"{"A":{"completed":true,"grade":"BB"}}"#)
        );
    }

    #[test]
    fn repeated_simulation_replaces_earlier_run() {
        let (mut store, events) = store();
        store.set_completion("A", true, Some(Grade::BB), None);

        let first = SimulationRequest::new(Gpa(400), 2).expect("request");
        let report = store.run_simulation(first).expect("simulation");
        assert_eq!(report.projected, store.metrics().gpa);

        let second = SimulationRequest::new(Gpa(100), 2).expect("request");
        let report = store.run_simulation(second).expect("simulation");
        assert_eq!(report.projected, store.metrics().gpa);
        assert_eq!(
            store.progress().iter().filter(|(_, e)| e.is_simulation).count(),
            report.grades.len()
        );
        assert_eq!(events.kinds().len(), 3);

        assert!(store.exit_simulation());
        assert_eq!(store.progress().completed_ids(), vec![CourseId::new("A")]);
    }

    #[test]
    fn run_simulation_without_candidates_changes_nothing() {
        let (mut store, events) = store();
        for id in ["A", "B", "C", "D", "S"] {
            store.set_completion(id, true, Some(Grade::AA), None);
        }
        let count = events.kinds().len();

        let request = SimulationRequest::new(Gpa(300), 3).expect("request");
        assert_eq!(store.run_simulation(request), Err(SimulationError::NoCandidates));
        assert!(!store.is_simulation());
        assert_eq!(events.kinds().len(), count);
    }

    #[test]
    fn import_replaces_map_and_leaves_simulation() {
        let (mut store, events) = store();
        store.set_completion("A", true, Some(Grade::AA), None);
        store.enter_simulation();

        let rows = vec![TranscriptRow::new("B", "BA"), TranscriptRow::new("O2", "CC")];
        let summary = store.import_rows(&rows).expect("import");

        assert_eq!(summary.matched, 2);
        assert!(!store.is_simulation());
        assert!(!store.progress().is_completed("A"));
        assert!(store.progress().is_completed("B"));
        assert_eq!(store.progress().get("S").expect("slot").selected_option, Some(1));
        assert_eq!(events.kinds().last(), Some(&ChangeKind::Imported { courses: 2 }));
        assert!(saved(&store).is_some_and(|json| json.contains("\"B\"")));
    }

    #[test]
    fn failed_import_changes_nothing() {
        let (mut store, events) = store();
        store.set_completion("A", true, Some(Grade::AA), None);
        let result = store.import_rows(&[TranscriptRow::new("A", "W")]);
        assert!(matches!(result, Err(ImportError::NothingToImport { .. })));
        assert!(store.progress().is_completed("A"));
        assert_eq!(events.kinds().len(), 1);
    }

    #[test]
    fn malformed_saved_progress_loads_empty() {
        let backend = StorageBackend::InMemory(MemoryStore::new().with_entry("T", "{not json"));
        let (store, _) = store_with(backend);
        assert!(store.progress().is_empty());
    }

    #[test]
    fn saved_progress_is_normalized() {
        let backend = StorageBackend::InMemory(MemoryStore::new().with_entry(
            "T",
            r#"{"A":{"completed":true,"grade":"","isSimulation":true},
                "D":{"completed":false,"grade":"","selectedCreditIndex":1}}"#,
        ));
        let (store, _) = store_with(backend);
        let a = store.progress().get("A").expect("entry");
        assert!(!a.completed);
        assert!(!a.is_simulation);
        assert_eq!(store.progress().get("D").expect("entry").selected_credit_index, None);
    }

    #[test]
    fn switch_department_loads_other_map() {
        let backend = StorageBackend::InMemory(MemoryStore::new().with_entry(
            "U",
            r#"{"X":{"completed":true,"grade":"DD"}}"#,
        ));
        let (mut store, events) = store_with(backend);
        store.set_completion("A", true, Some(Grade::AA), None);
        store.enter_simulation();

        let other = Curriculum::from_json(r#"{"code":"U","courses":[{"id":"X","term":1,"credits":2}]}"#)
            .expect("curriculum");
        store.switch_department(other);

        assert_eq!(store.department(), "U");
        assert!(!store.is_simulation());
        assert!(store.progress().is_passed("X"));
        assert_eq!(events.kinds().last(), Some(&ChangeKind::DepartmentSwitched));
    }
}
