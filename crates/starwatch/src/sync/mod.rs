//! The synchronization engine.
//!
//! # Module structure
//!
//! - [`types`] - result structs and engine constants
//! - [`progress`] - progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`gate`] - the rate-limit budget gate
//! - [`stars`] - star-list reconciliation for one user
//! - [`releases`] - release/tag reconciliation for one repository
//! - [`fetch`] - the sequential fetch pass over all tracked repositories
//! - [`latest`] - the "newest version per starred repository" aggregator
//!
//! # Example
//!
//! ```ignore
//! use starwatch::sync::{self, BudgetGate, SortOrder};
//!
//! sync::sync_stars(&source, &store, "gaul").await?;
//! let pass = sync::fetch_all(&source, &store, &store, &BudgetGate::default(), None).await?;
//! tracing::info!(processed = pass.processed, discovered = pass.discovered, "pass done");
//! let view = sync::latest_versions(&store, &store, "gaul", SortOrder::Ascending).await?;
//! ```

mod fetch;
mod gate;
mod latest;
mod progress;
mod releases;
mod stars;
mod types;

use thiserror::Error;

use crate::remote::RemoteError;
use crate::store::StoreError;

pub use fetch::fetch_all;
pub use gate::BudgetGate;
pub use latest::{latest_versions, SortOrder, VersionsView};
pub use progress::{emit, ProgressCallback, SyncProgress};
pub use releases::sync_releases;
pub use stars::sync_stars;
pub use types::{
    FetchPassResult, ReleaseSyncResult, StarSyncResult, DEFAULT_BUDGET_THRESHOLD,
    DEFAULT_QUERY_CONCURRENCY, MAX_TAG_BACKLOG,
};

/// Errors raised by the sync engine.
///
/// Remote failures abort only the unit of work that hit them (the fetch
/// pass logs and continues); store failures are always fatal for the
/// operation, since an unreachable store voids the idempotence assumptions
/// the engine relies on.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
