//! # Persistence Format
//!
//! JSON serialization of a department's progress map.
//!
//! The payload is one object keyed by course id:
//!
//! ```json
//! {"MATH101": {"completed": true, "grade": "BA"},
//!  "REXX1":   {"completed": false, "grade": "", "selectedOption": 2}}
//! ```
//!
//! Storage I/O happens in [`crate::storage`]; this module only converts.
//!
//! ## Security
//!
//! The payload size is checked against [`MAX_PERSISTED_PAYLOAD`] before
//! parsing, so an oversized value is refused without allocating for it.

use crate::primitives::MAX_PERSISTED_PAYLOAD;
use crate::{CoursemapError, ProgressMap};

/// Serialize a progress map.
///
/// Credit selections of incomplete courses are not written.
pub fn progress_to_json(progress: &ProgressMap) -> Result<String, CoursemapError> {
    let mut snapshot = progress.clone();
    for (_, entry) in snapshot.iter_mut() {
        if !entry.completed {
            entry.selected_credit_index = None;
        }
    }
    serde_json::to_string(&snapshot).map_err(|e| CoursemapError::SerializationError(e.to_string()))
}

/// Deserialize a progress map.
pub fn progress_from_json(json: &str) -> Result<ProgressMap, CoursemapError> {
    if json.len() > MAX_PERSISTED_PAYLOAD {
        return Err(CoursemapError::DeserializationError(format!(
            "Payload too large: {} bytes (max {})",
            json.len(),
            MAX_PERSISTED_PAYLOAD
        )));
    }
    serde_json::from_str(json).map_err(|e| CoursemapError::DeserializationError(e.to_string()))
}
