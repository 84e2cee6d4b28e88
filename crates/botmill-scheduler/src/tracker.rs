//! Execution tracker — per-job memory of the last fire.
//!
//! One map for the whole manager, keyed by job path. Workers only ever
//! touch their own key, but the map itself is shared for observability,
//! so access goes through a mutex. No eviction, no bound, no persistence:
//! entries live for the process lifetime and start from the rule's
//! sentinel.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::rules::{Marker, Trigger};

/// Map from job path to its current [`Marker`].
#[derive(Default)]
pub struct ExecutionTracker {
    markers: Mutex<HashMap<String, Marker>>,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current marker for a job, or the sentinel appropriate to its
    /// trigger kind when the job has never been checked.
    pub fn get(&self, path: &str, trigger: &Trigger) -> Marker {
        self.lock()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Marker::sentinel_for(trigger))
    }

    /// Store a job's marker unconditionally.
    pub fn set(&self, path: &str, marker: Marker) {
        self.lock().insert(path.to_owned(), marker);
    }

    /// Copy of the whole map, for doctor/status style inspection.
    pub fn snapshot(&self) -> HashMap<String, Marker> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Marker>> {
        // A poisoned map is still a valid map of markers.
        self.markers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
