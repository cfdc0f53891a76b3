//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command opens the configured department's store, acts on it and
//! prints either a human-readable report or, with `--json-mode`, JSON.

use crate::actions;
use crate::api;
use crate::config::Config;
use crate::events::LogObserver;
use crate::transcript::{FileTranscriptSource, FormatChoice, read_rows};
use coursemap_core::{
    ClauseStatus, Course, CoursemapError, Gpa, Grade, ProgressStore, SimulationRequest,
    clause_status, related_courses,
};
use std::path::Path;
use std::sync::Arc;

/// Open the configured store with logging attached.
fn open_store(config: &Config) -> Result<ProgressStore, CoursemapError> {
    let mut store = config.open_store()?;
    store.subscribe(Arc::new(LogObserver));
    Ok(store)
}

fn print_json(output: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

/// One-word state of a course for listings.
fn course_state(store: &ProgressStore, course: &Course) -> String {
    match store.progress().get(course.id.as_str()) {
        Some(entry) if entry.completed => entry
            .grade
            .map_or_else(|| "done".to_string(), |g| g.to_string()),
        _ if store.is_locked(course.id.as_str()) => "locked".to_string(),
        _ => "open".to_string(),
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config, host: &str, port: u16) -> Result<(), CoursemapError> {
    let store = config.open_store()?;

    println!("Coursemap Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Department: {}", store.department());
    println!("  Backend:    {}", config.backend);
    println!("  Database:   {:?}", config.database);
    println!();
    println!("Endpoints:");
    println!("  GET  /status            - Metrics and revision");
    println!("  GET  /courses           - Course list");
    println!("  GET  /courses/{{id}}      - Course detail");
    println!("  POST /progress          - Complete or uncheck a course");
    println!("  POST /simulation/run    - Simulate grades toward a target GPA");
    println!("  POST /transcript        - Import a plain-text transcript");
    println!("  GET  /health            - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, store).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show department metrics.
pub fn cmd_status(config: &Config, json_mode: bool) -> Result<(), CoursemapError> {
    let store = open_store(config)?;
    let metrics = store.metrics();
    let curriculum = store.curriculum();

    if json_mode {
        print_json(&serde_json::json!({
            "department": store.department(),
            "name": curriculum.name(),
            "backend": config.backend.to_string(),
            "total_courses": curriculum.len(),
            "completed_courses": metrics.completed_courses,
            "earned_credits": metrics.earned_credits,
            "graded_credits": metrics.graded_credits,
            "gpa": metrics.gpa.to_string()
        }));
        return Ok(());
    }

    println!("Coursemap Status");
    println!("================");
    println!("Department: {} ({})", store.department(), curriculum.name());
    println!("Backend:    {}", config.backend);
    println!();
    println!(
        "Completed:       {} / {}",
        metrics.completed_courses,
        curriculum.len()
    );
    println!("Earned credits:  {}", metrics.earned_credits);
    println!("Graded credits:  {}", metrics.graded_credits);
    println!("GPA:             {}", metrics.gpa);

    Ok(())
}

// =============================================================================
// COURSE LISTING
// =============================================================================

/// List courses, optionally for one term.
pub fn cmd_courses(config: &Config, json_mode: bool, term: Option<u8>) -> Result<(), CoursemapError> {
    let store = open_store(config)?;
    let courses: Vec<&Course> = store
        .curriculum()
        .courses()
        .iter()
        .filter(|c| term.is_none_or(|t| c.term == t))
        .collect();

    if json_mode {
        let rows: Vec<serde_json::Value> = courses
            .iter()
            .map(|course| {
                let entry = store.progress().get(course.id.as_str());
                serde_json::json!({
                    "id": course.id,
                    "display_id": course.display_id(entry),
                    "name": course.display_name(entry),
                    "term": course.term,
                    "credits": course.effective_credits(entry),
                    "state": course_state(&store, course)
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "department": store.department(),
            "courses": rows
        }));
        return Ok(());
    }

    let mut current_term = None;
    for course in courses {
        if current_term != Some(course.term) {
            current_term = Some(course.term);
            println!();
            println!("Term {}", course.term);
            println!("------");
        }
        let entry = store.progress().get(course.id.as_str());
        println!(
            "  {:<10} {:<40} {:>2} cr  {}",
            course.display_id(entry).as_str(),
            course.display_name(entry),
            course.effective_credits(entry),
            course_state(&store, course)
        );
    }

    Ok(())
}

/// Show one course in detail.
pub fn cmd_show(config: &Config, json_mode: bool, raw_id: &str) -> Result<(), CoursemapError> {
    let store = open_store(config)?;
    let id = actions::resolve(&store, raw_id)?;
    let curriculum = store.curriculum();
    let (Some(course), Some(related)) = (
        curriculum.get(id.as_str()),
        related_courses(id.as_str(), curriculum, store.progress()),
    ) else {
        return Err(CoursemapError::CourseNotFound(raw_id.to_string()));
    };
    let clauses = clause_status(id.as_str(), curriculum, store.progress());
    let entry = store.progress().get(id.as_str());

    if json_mode {
        print_json(&serde_json::json!({
            "id": course.id,
            "display_id": course.display_id(entry),
            "name": course.display_name(entry),
            "term": course.term,
            "credits": course.effective_credits(entry),
            "state": course_state(&store, course),
            "options": course.options.iter().map(|o| &o.id).collect::<Vec<_>>(),
            "clauses": clauses,
            "related": related
        }));
        return Ok(());
    }

    println!("{} - {}", course.display_id(entry), course.display_name(entry));
    println!("Term {}, {} credits, {}", course.term, course.effective_credits(entry), course_state(&store, course));

    if !course.options.is_empty() {
        println!();
        println!("Options:");
        let selected = entry.and_then(|e| e.selected_option);
        for (i, option) in course.options.iter().enumerate() {
            let marker = if selected == Some(i) { "*" } else { " " };
            println!(" {} [{}] {} - {}", marker, i, option.id, option.name);
        }
    }

    if !clauses.is_empty() {
        println!();
        println!("Prerequisites:");
        for clause in &clauses {
            let mark = if clause.is_satisfied() { "ok" } else { "--" };
            match clause {
                ClauseStatus::Course { course_id, soft, .. } => {
                    let soft = if *soft { " (soft)" } else { "" };
                    println!("  [{}] {}{}", mark, course_id, soft);
                }
                ClauseStatus::CountPattern {
                    count,
                    min_count,
                    message,
                    ..
                } => println!("  [{}] {} ({}/{})", mark, message, count, min_count),
                ClauseStatus::MinCredits {
                    earned, required, ..
                } => println!("  [{}] {} credits ({} earned)", mark, required, earned),
            }
        }
    }

    if !related.dependents.is_empty() {
        println!();
        let dependents: Vec<&str> = related.dependents.iter().map(|d| d.as_str()).collect();
        println!("Required by: {}", dependents.join(", "));
    }

    Ok(())
}

// =============================================================================
// MUTATION COMMANDS
// =============================================================================

/// Mark a course completed with a grade.
pub fn cmd_complete(
    config: &Config,
    json_mode: bool,
    raw_id: &str,
    grade: &str,
    option: Option<usize>,
) -> Result<(), CoursemapError> {
    let grade: Grade = grade.parse()?;
    let mut store = open_store(config)?;
    let (id, _) = actions::set_completion(&mut store, raw_id, true, Some(grade), option)?;

    if json_mode {
        print_json(&serde_json::json!({
            "course_id": id,
            "grade": grade,
            "metrics": store.metrics()
        }));
    } else {
        let metrics = store.metrics();
        println!("Completed {} with {}", id, grade);
        println!("GPA: {}  Earned credits: {}", metrics.gpa, metrics.earned_credits);
    }
    Ok(())
}

/// Mark a course incomplete, cascading to dependents.
pub fn cmd_uncheck(config: &Config, json_mode: bool, raw_id: &str) -> Result<(), CoursemapError> {
    let mut store = open_store(config)?;
    let (id, invalidated) = actions::set_completion(&mut store, raw_id, false, None, None)?;

    if json_mode {
        print_json(&serde_json::json!({
            "course_id": id,
            "invalidated": invalidated,
            "metrics": store.metrics()
        }));
        return Ok(());
    }

    println!("Unchecked {}", id);
    if !invalidated.is_empty() {
        let ids: Vec<&str> = invalidated.iter().map(|c| c.as_str()).collect();
        println!("Also unchecked (missing prerequisite): {}", ids.join(", "));
    }
    Ok(())
}

/// Choose or clear an elective option.
pub fn cmd_select_option(
    config: &Config,
    json_mode: bool,
    raw_id: &str,
    index: Option<usize>,
) -> Result<(), CoursemapError> {
    let mut store = open_store(config)?;
    let id = actions::select_option(&mut store, raw_id, index)?;
    let course = store.curriculum().get(id.as_str());
    let entry = store.progress().get(id.as_str());
    let display = course.map_or(&id, |c| c.display_id(entry));

    if json_mode {
        print_json(&serde_json::json!({
            "course_id": id,
            "selected_option": index,
            "display_id": display
        }));
    } else {
        println!("{} now shows as {}", id, display);
    }
    Ok(())
}

/// Choose a value of a variable-credit course.
pub fn cmd_select_credit(
    config: &Config,
    json_mode: bool,
    raw_id: &str,
    index: usize,
) -> Result<(), CoursemapError> {
    let mut store = open_store(config)?;
    let id = actions::select_credit(&mut store, raw_id, index)?;
    let credits = store
        .curriculum()
        .get(id.as_str())
        .map_or(0, |c| c.effective_credits(store.progress().get(id.as_str())));

    if json_mode {
        print_json(&serde_json::json!({
            "course_id": id,
            "credits": credits,
            "metrics": store.metrics()
        }));
    } else {
        println!("{} now counts {} credits", id, credits);
    }
    Ok(())
}

/// Clear the department's progress.
pub fn cmd_reset(config: &Config, json_mode: bool) -> Result<(), CoursemapError> {
    let mut store = open_store(config)?;
    store.reset();

    if json_mode {
        print_json(&serde_json::json!({ "department": store.department(), "reset": true }));
    } else {
        println!("Progress of {} cleared", store.department());
    }
    Ok(())
}

// =============================================================================
// SIMULATION COMMAND
// =============================================================================

/// Preview grades for upcoming courses that reach a target GPA.
///
/// Runs in simulation mode, so saved progress is untouched.
pub fn cmd_simulate(
    config: &Config,
    json_mode: bool,
    target: Gpa,
    count: i64,
) -> Result<(), CoursemapError> {
    let request = SimulationRequest::new(target, count)?;
    let mut store = open_store(config)?;
    let current = store.metrics().gpa;
    let report = store.run_simulation(request)?;

    if json_mode {
        print_json(&serde_json::json!({
            "current": current,
            "report": report
        }));
        return Ok(());
    }

    println!("Simulation toward {} (current {})", report.target, current);
    println!();
    for simulated in &report.grades {
        println!(
            "  {:<10} {:>2} cr  {}",
            simulated.course_id.as_str(),
            simulated.credits,
            simulated.grade
        );
    }
    println!();
    println!("Projected GPA: {}", report.projected);
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Replace progress from a plain-text transcript.
pub async fn cmd_import(
    config: &Config,
    json_mode: bool,
    file: &Path,
    format: FormatChoice,
) -> Result<(), CoursemapError> {
    let (format, rows) = read_rows(&FileTranscriptSource::new(file), format).await?;
    let mut store = open_store(config)?;
    let summary = store.import_rows(&rows)?;

    if json_mode {
        print_json(&serde_json::json!({
            "format": format,
            "summary": summary,
            "metrics": store.metrics()
        }));
        return Ok(());
    }

    let metrics = store.metrics();
    println!("Transcript imported ({:?} layout)", format);
    println!("  Matched:    {}", summary.matched);
    println!("  Unmatched:  {}", summary.unmatched);
    println!("  Skipped:    {}", summary.skipped);
    println!("  Rejected:   {}", summary.rejected);
    println!("  Superseded: {}", summary.superseded);
    println!();
    println!("GPA: {}  Earned credits: {}", metrics.gpa, metrics.earned_credits);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::BackendKind;

    const ME_CURRICULUM: &str = include_str!("../../../../curricula/ME.json");

    fn redb_config(dir: &Path) -> Config {
        std::fs::write(dir.join("ME.json"), ME_CURRICULUM).unwrap();
        Config {
            backend: BackendKind::Redb,
            database: dir.join("progress.db"),
            curricula_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn completion_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = redb_config(dir.path());

        cmd_complete(&config, true, "math 101", "AA", None).unwrap();
        cmd_complete(&config, true, "MATH102", "bb", None).unwrap();

        let store = config.open_store().unwrap();
        assert!(store.progress().is_passed("MATH101"));
        assert!(store.progress().is_passed("MATH102"));
    }

    #[test]
    fn locked_completion_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = redb_config(dir.path());

        let result = cmd_complete(&config, true, "ME202", "AA", None);
        assert!(matches!(result, Err(CoursemapError::CourseLocked(_))));
    }

    #[test]
    fn invalid_grade_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = redb_config(dir.path());

        let result = cmd_complete(&config, true, "MATH101", "A+", None);
        assert!(matches!(result, Err(CoursemapError::InvalidGrade(_))));
    }

    #[test]
    fn simulate_leaves_saved_progress() {
        let dir = tempfile::tempdir().unwrap();
        let config = redb_config(dir.path());
        cmd_complete(&config, true, "MATH101", "CC", None).unwrap();

        cmd_simulate(&config, true, Gpa::from_hundredths(350), 3).unwrap();

        let store = config.open_store().unwrap();
        assert_eq!(store.progress().completed_ids().len(), 1);
    }

    #[test]
    fn simulate_rejects_bad_count() {
        let dir = tempfile::tempdir().unwrap();
        let config = redb_config(dir.path());

        let result = cmd_simulate(&config, true, Gpa::from_hundredths(300), 0);
        assert!(matches!(result, Err(CoursemapError::Simulation(_))));
    }

    #[tokio::test]
    async fn import_replaces_progress() {
        let dir = tempfile::tempdir().unwrap();
        let config = redb_config(dir.path());
        cmd_complete(&config, true, "ME101", "AA", None).unwrap();

        let transcript = dir.path().join("transcript.txt");
        std::fs::write(&transcript, "MATH 101 Calculus I 4 BA\nAFE 131 English 3 BB\n").unwrap();
        cmd_import(&config, true, &transcript, FormatChoice::School)
            .await
            .unwrap();

        let store = config.open_store().unwrap();
        assert!(store.progress().is_passed("MATH101"));
        assert!(store.progress().is_passed("REXX1"));
        assert!(!store.progress().is_completed("ME101"));
    }

    #[tokio::test]
    async fn failed_extraction_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = redb_config(dir.path());
        cmd_complete(&config, true, "ME101", "AA", None).unwrap();

        let result = cmd_import(
            &config,
            true,
            &dir.path().join("missing.txt"),
            FormatChoice::Auto,
        )
        .await;
        assert!(matches!(result, Err(CoursemapError::Import(_))));

        let store = config.open_store().unwrap();
        assert!(store.progress().is_passed("ME101"));
    }
}
