//! The fetch pass: release reconciliation over every tracked repository.

use crate::remote::ReleaseSource;
use crate::store::{StarStore, VersionStore};

use super::gate::BudgetGate;
use super::progress::{emit, ProgressCallback, SyncProgress};
use super::releases::sync_releases;
use super::types::FetchPassResult;
use super::SyncError;

/// Run one fetch pass over the union of all users' starred repositories.
///
/// Repositories are processed strictly sequentially: the gate's view of the
/// remaining budget is only meaningful when calls do not race it. Before
/// each repository the gate is consulted and may park the pass.
///
/// Failure policy: a remote failure on one repository is logged, recorded
/// in the result, and the pass moves on - the next pass will catch up. A
/// repository the remote reports gone is counted and skipped; its stored
/// history stays. Store failures and budget-query failures abort the pass.
#[tracing::instrument(skip_all)]
pub async fn fetch_all<R, S, V>(
    source: &R,
    stars: &S,
    versions: &V,
    gate: &BudgetGate,
    on_progress: Option<&ProgressCallback>,
) -> Result<FetchPassResult, SyncError>
where
    R: ReleaseSource + ?Sized,
    S: StarStore + ?Sized,
    V: VersionStore + ?Sized,
{
    let tracked = stars.all_tracked_repositories().await?;
    let mut result = FetchPassResult::default();

    emit(
        on_progress,
        SyncProgress::PassStarted {
            total: tracked.len(),
        },
    );

    for repository in &tracked {
        gate.acquire(source, on_progress).await.map_err(SyncError::Remote)?;

        match sync_releases(source, versions, repository).await {
            Ok(sync) => {
                result.processed += 1;
                result.discovered += sync.appended;
                if sync.appended > 0 {
                    result.updated += 1;
                }
                emit(
                    on_progress,
                    SyncProgress::RepositorySynced {
                        repository: repository.clone(),
                        appended: sync.appended,
                        used_tag_fallback: sync.used_tag_fallback,
                    },
                );
            }
            Err(SyncError::Remote(e)) if e.is_gone() => {
                result.processed += 1;
                result.skipped_gone += 1;
                tracing::warn!(repository = %repository, "repository gone, skipping");
                emit(
                    on_progress,
                    SyncProgress::RepositoryGone {
                        repository: repository.clone(),
                    },
                );
            }
            Err(SyncError::Remote(e)) => {
                result.processed += 1;
                tracing::warn!(repository = %repository, error = %e, "repository sync failed, continuing");
                result.errors.push(format!("{repository}: {e}"));
                emit(
                    on_progress,
                    SyncProgress::RepositoryFailed {
                        repository: repository.clone(),
                        error: e.to_string(),
                    },
                );
            }
            // An unreachable store voids the rest of the pass.
            Err(e @ SyncError::Store(_)) => return Err(e),
        }
    }

    emit(
        on_progress,
        SyncProgress::PassComplete {
            processed: result.processed,
            discovered: result.discovered,
            errors: result.errors.len(),
        },
    );
    tracing::info!(
        processed = result.processed,
        updated = result.updated,
        discovered = result.discovered,
        skipped_gone = result.skipped_gone,
        errors = result.errors.len(),
        "fetch pass complete"
    );

    Ok(result)
}
