//! Shared engine types and constants.

use std::time::Duration;

/// Maximum previously-unseen tags recorded per repository per pass.
///
/// Caps remote call volume when a repository has a long tag history;
/// subsequent passes catch up three tags at a time.
pub const MAX_TAG_BACKLOG: usize = 3;

/// Budget floor below which a fetch pass parks. Meaningfully below the
/// 5000/hour core cap so the rest of the pass has headroom.
pub const DEFAULT_BUDGET_THRESHOLD: u32 = 1_000;

/// How long the gate sleeps between budget re-checks.
pub const BUDGET_PAUSE: Duration = Duration::from_secs(60);

/// Bounded fan-out for per-repository latest queries.
pub const DEFAULT_QUERY_CONCURRENCY: usize = 8;

/// Result of reconciling one user's star list.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StarSyncResult {
    /// Size of the remote star list at observation time.
    pub remote_total: usize,
    /// Memberships added.
    pub added: usize,
    /// Memberships removed.
    pub removed: usize,
}

/// Result of reconciling one repository's releases.
#[derive(Debug)]
pub struct ReleaseSyncResult {
    /// The repository that was reconciled.
    pub repository: String,
    /// Rows actually appended to the version store.
    pub appended: u64,
    /// Whether the tag-list fallback ran (no releases in use).
    pub used_tag_fallback: bool,
    /// Whether the tag backlog cap cut off further unseen tags.
    pub truncated: bool,
}

/// Result of a full fetch pass.
#[derive(Debug, Default)]
pub struct FetchPassResult {
    /// Repositories visited.
    pub processed: usize,
    /// Repositories that gained at least one new version.
    pub updated: usize,
    /// Total new versions recorded.
    pub discovered: u64,
    /// Repositories skipped because the remote reports them gone.
    pub skipped_gone: usize,
    /// Per-repository failures (non-fatal, pass continued).
    pub errors: Vec<String>,
}
