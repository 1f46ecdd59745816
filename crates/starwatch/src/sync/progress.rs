//! Progress reporting for sync operations.

use chrono::{DateTime, Utc};

/// Progress events emitted during a fetch pass.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A fetch pass is starting.
    PassStarted {
        /// Number of tracked repositories to visit.
        total: usize,
    },

    /// The budget gate parked the pass until the next re-check.
    BudgetLow {
        /// Calls remaining in the current window.
        remaining: u32,
        /// The configured safety floor.
        threshold: u32,
        /// When the window resets.
        reset_at: DateTime<Utc>,
    },

    /// One repository finished reconciling.
    RepositorySynced {
        repository: String,
        /// New versions recorded for it this pass.
        appended: u64,
        /// Whether the tag-list fallback ran.
        used_tag_fallback: bool,
    },

    /// The remote reports the repository gone; it was skipped.
    RepositoryGone { repository: String },

    /// Reconciling one repository failed; the pass continues.
    RepositoryFailed { repository: String, error: String },

    /// The fetch pass finished.
    PassComplete {
        processed: usize,
        discovered: u64,
        errors: usize,
    },
}

/// Callback for receiving progress events.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit an event if a callback is configured.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
