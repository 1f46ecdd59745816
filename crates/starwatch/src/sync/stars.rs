//! Star-list reconciliation for one user.

use std::collections::BTreeSet;

use crate::remote::ReleaseSource;
use crate::store::StarStore;

use super::types::StarSyncResult;
use super::SyncError;

/// Mirror one user's remote star list into the star store.
///
/// The remote list is fetched before anything else: a remote failure aborts
/// here, so the store is never mutated from a partial observation. The diff
/// is then applied as a batched add/remove; after a successful call the
/// stored membership equals the remote list as observed at call time.
/// Concurrent remote changes are simply picked up on the next pass.
#[tracing::instrument(skip(source, stars), fields(user = %user))]
pub async fn sync_stars<R, S>(
    source: &R,
    stars: &S,
    user: &str,
) -> Result<StarSyncResult, SyncError>
where
    R: ReleaseSource + ?Sized,
    S: StarStore + ?Sized,
{
    let remote: BTreeSet<String> = source
        .starred_repositories(user)
        .await?
        .into_iter()
        .collect();

    let stored = stars.current_stars(user).await?;

    let to_remove: BTreeSet<String> = stored.difference(&remote).cloned().collect();
    let to_add: BTreeSet<String> = remote.difference(&stored).cloned().collect();

    stars.apply_diff(user, &to_add, &to_remove).await?;

    let result = StarSyncResult {
        remote_total: remote.len(),
        added: to_add.len(),
        removed: to_remove.len(),
    };
    tracing::info!(
        remote_total = result.remote_total,
        added = result.added,
        removed = result.removed,
        "star list reconciled"
    );

    Ok(result)
}
