//! Progress reporting for the CLI: sync events rendered through tracing.

use starwatch::sync::{ProgressCallback, SyncProgress};

/// Reporter translating engine progress events into structured log lines.
pub struct LoggingReporter;

impl LoggingReporter {
    /// Box the reporter into the engine's callback type.
    pub fn into_callback() -> ProgressCallback {
        Box::new(|event| Self::handle(event))
    }

    fn handle(event: SyncProgress) {
        match event {
            SyncProgress::PassStarted { total } => {
                tracing::info!(total, "starting fetch pass");
            }

            SyncProgress::BudgetLow {
                remaining,
                threshold,
                reset_at,
            } => {
                tracing::info!(remaining, threshold, reset_at = %reset_at, "rate budget low, waiting");
            }

            SyncProgress::RepositorySynced {
                repository,
                appended,
                used_tag_fallback,
            } => {
                if appended > 0 {
                    tracing::info!(repository = %repository, appended, used_tag_fallback, "new versions recorded");
                } else {
                    tracing::debug!(repository = %repository, "up to date");
                }
            }

            SyncProgress::RepositoryGone { repository } => {
                tracing::warn!(repository = %repository, "repository gone, skipped");
            }

            SyncProgress::RepositoryFailed { repository, error } => {
                tracing::warn!(repository = %repository, error = %error, "repository sync failed");
            }

            SyncProgress::PassComplete {
                processed,
                discovered,
                errors,
            } => {
                tracing::info!(processed, discovered, errors, "fetch pass complete");
            }

            _ => {}
        }
    }
}
