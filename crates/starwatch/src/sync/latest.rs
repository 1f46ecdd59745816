//! The query aggregator: newest version per starred repository.

use futures::stream::{self, StreamExt};

use crate::store::{LatestStrategy, StarStore, VersionRecord, VersionStore};

use super::types::DEFAULT_QUERY_CONCURRENCY;
use super::SyncError;

/// Sort direction for the aggregated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first - terminal listings.
    Ascending,
    /// Newest first - feed-style consumers.
    Descending,
}

/// The aggregated "latest versions" result for one user.
///
/// `expected` counts the starred repositories that were queried and `failed`
/// the per-repository lookups that errored; a caller must treat
/// `failed > 0` as a degraded result, not a complete one. Repositories with
/// no recorded versions are omitted silently and count toward neither.
#[derive(Debug)]
pub struct VersionsView {
    /// One row per starred repository with at least one recorded version.
    pub rows: Vec<VersionRecord>,
    /// Starred repositories queried.
    pub expected: usize,
    /// Per-repository lookups that failed (fan-out backends only).
    pub failed: usize,
}

impl VersionsView {
    /// Whether every per-repository lookup completed.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Resolve the newest recorded version of each repository starred by `user`,
/// sorted by date.
///
/// The physical plan follows the backend's [`LatestStrategy`]:
///
/// - `Combined` backends answer the whole repository set in one query; an
///   error there fails the call (no silent partial result).
/// - `PartitionedFanOut` backends get one bounded top-1 query per starred
///   repository. The lookups are independent and order-insensitive, so they
///   run concurrently (bounded fan-out) and merge after all complete; a
///   failed lookup drops its row but is counted in the view.
#[tracing::instrument(skip(stars, versions), fields(user = %user))]
pub async fn latest_versions<S, V>(
    stars: &S,
    versions: &V,
    user: &str,
    order: SortOrder,
) -> Result<VersionsView, SyncError>
where
    S: StarStore + ?Sized,
    V: VersionStore + ?Sized,
{
    let starred = stars.current_stars(user).await?;
    let repositories: Vec<String> = starred.into_iter().collect();
    let expected = repositories.len();

    if repositories.is_empty() {
        return Ok(VersionsView {
            rows: Vec::new(),
            expected: 0,
            failed: 0,
        });
    }

    let (mut rows, failed) = match versions.latest_strategy() {
        LatestStrategy::Combined => (versions.latest_per_repository(&repositories).await?, 0),
        LatestStrategy::PartitionedFanOut => {
            let results: Vec<_> = stream::iter(repositories.iter())
                .map(|repository| async move {
                    (
                        repository,
                        versions.latest_for_repository(repository).await,
                    )
                })
                .buffer_unordered(DEFAULT_QUERY_CONCURRENCY)
                .collect()
                .await;

            let mut rows = Vec::with_capacity(results.len());
            let mut failed = 0usize;
            for (repository, outcome) in results {
                match outcome {
                    Ok(Some(record)) => rows.push(record),
                    Ok(None) => {}
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(repository = %repository, error = %e, "latest lookup failed");
                    }
                }
            }
            (rows, failed)
        }
    };

    match order {
        SortOrder::Ascending => {
            rows.sort_by(|a, b| (a.created_at, &a.repository).cmp(&(b.created_at, &b.repository)));
        }
        SortOrder::Descending => {
            rows.sort_by(|a, b| (b.created_at, &b.repository).cmp(&(a.created_at, &a.repository)));
        }
    }

    Ok(VersionsView {
        rows,
        expected,
        failed,
    })
}
