//! Starwatch - a release tracker for starred repositories.
//!
//! This library keeps a durable, deduplicated record of the newest release or
//! tag of every repository starred by a set of users. A periodic fetch pass
//! reconciles the stored state against the remote hosting platform while
//! respecting its rate-limit budget; consumers then read the aggregated
//! "latest version per starred repository" view without touching the remote
//! API at all.
//!
//! # Example
//!
//! ```ignore
//! use starwatch::store::Store;
//! use starwatch::remote::github::GitHubSource;
//! use starwatch::sync::{self, BudgetGate, SortOrder};
//!
//! let store = Store::open("sqlite://starwatch.db?mode=rwc").await?;
//! let source = GitHubSource::new(&token)?;
//!
//! // Mirror one user's star list, then refresh versions for everything tracked.
//! sync::sync_stars(&source, &store, "gaul").await?;
//! sync::fetch_all(&source, &store, &store, &BudgetGate::default(), None).await?;
//!
//! // What changed?
//! let view = sync::latest_versions(&store, &store, "gaul", SortOrder::Descending).await?;
//! ```

pub mod entity;
pub mod migration;
pub mod remote;
pub mod retry;
pub mod store;
pub mod sync;

pub use remote::{RateBudget, Release, ReleaseSource, RemoteError, TagMetadata};
pub use store::{
    LatestStrategy, RecordStore, StarStore, Store, StoreError, VersionEntry, VersionRecord,
    VersionStore,
};
pub use sync::{BudgetGate, SortOrder, SyncError, VersionsView};
