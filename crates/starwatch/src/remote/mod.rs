//! Remote release source abstraction.
//!
//! The sync engine talks to the hosting platform exclusively through the
//! [`ReleaseSource`] trait: the starred-repository listing, the latest
//! release lookup, the tag list with per-tag date metadata, and the
//! rate-limit budget. The concrete GitHub implementation lives in
//! [`github`].

pub mod github;

mod error;

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

pub use error::{RemoteError, Result};

/// A published release of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// The tag the release was cut from.
    pub tag: String,
    /// When the release was published.
    pub published_at: DateTime<Utc>,
    /// Link to the release notes, when the platform provides one.
    pub url: Option<String>,
}

/// Date metadata for a single tag.
///
/// Heavyweight (annotated) tags carry their own tagger date; lightweight
/// tags only have the target commit's committer date. Callers prefer the
/// tagger date and fall back to the committer date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagMetadata {
    pub tagger_date: Option<DateTime<Utc>>,
    pub committer_date: Option<DateTime<Utc>>,
}

impl TagMetadata {
    /// The date to record for this tag: tagger first, committer otherwise.
    pub fn resolved_date(&self) -> Option<DateTime<Utc>> {
        self.tagger_date.or(self.committer_date)
    }
}

/// The remote API's call budget for the current window.
///
/// Ephemeral: re-fetched on demand and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    /// Maximum calls per window.
    pub limit: u32,
    /// Calls remaining in the current window.
    pub remaining: u32,
    /// When the window resets.
    pub reset_at: DateTime<Utc>,
}

/// A remote hosting platform as seen by the sync engine.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Full names of all repositories the user has starred, across all
    /// result pages.
    async fn starred_repositories(&self, user: &str) -> Result<Vec<String>>;

    /// The repository's latest release, or `None` when the repository does
    /// not use releases. `None` is an expected condition, not an error.
    async fn latest_release(&self, repository: &str) -> Result<Option<Release>>;

    /// One bounded page of tag names, in exactly the order the remote
    /// returns them (not necessarily chronological).
    async fn tags(&self, repository: &str) -> Result<Vec<String>>;

    /// Date metadata for one tag. Resolved lazily so callers only pay for
    /// tags they actually intend to record.
    async fn tag_metadata(&self, repository: &str, tag: &str) -> Result<TagMetadata>;

    /// The current rate-limit budget.
    async fn rate_budget(&self) -> Result<RateBudget>;
}

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default requests-per-second pacing for GitHub. The hourly budget allows
/// ~1.4/sec sustained; 10/sec permits short bursts without tripping
/// secondary limits.
pub const GITHUB_DEFAULT_RPS: u32 = 10;

/// Proactive request pacer (token bucket).
///
/// Distinct from the budget gate in the sync engine: the gate parks a whole
/// fetch pass when the remaining window budget runs low, while the pacer
/// spreads individual calls out within an available budget.
#[derive(Clone)]
pub struct RequestPacer {
    inner: Arc<GovernorRateLimiter>,
}

impl RequestPacer {
    /// Create a pacer allowing `requests_per_second` calls (minimum 1).
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap());
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    /// Wait until the next request is allowed.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}
