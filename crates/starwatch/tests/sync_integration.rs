//! End-to-end sync tests against both storage backends.
//!
//! A scripted remote source drives the full flow: star reconciliation,
//! a budget-gated fetch pass with the tag fallback, and the aggregated
//! latest-versions view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use starwatch::remote::{
    RateBudget, Release, ReleaseSource, RemoteError, Result as RemoteResult, TagMetadata,
};
use starwatch::store::{KvStore, SqlStore, StarStore, StoreError, VersionStore};
use starwatch::sync::{self, BudgetGate, SortOrder, SyncError};

/// Guard against hangs: no test operation should take this long.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// One scripted repository: a release, a tag list, or gone.
#[derive(Clone)]
enum RepoScript {
    Release(Release),
    Tags(Vec<(String, TagMetadata)>),
    Gone,
    Failing,
}

/// Scripted remote platform.
struct ScriptedSource {
    stars: HashMap<String, Vec<String>>,
    repos: HashMap<String, RepoScript>,
    budget_calls: AtomicU32,
    /// remaining values served to successive budget queries.
    budget: Vec<u32>,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            stars: HashMap::new(),
            repos: HashMap::new(),
            budget_calls: AtomicU32::new(0),
            budget: vec![5000],
        }
    }

    fn star(mut self, user: &str, repos: &[&str]) -> Self {
        self.stars
            .insert(user.to_string(), repos.iter().map(|r| r.to_string()).collect());
        self
    }

    fn repo(mut self, name: &str, script: RepoScript) -> Self {
        self.repos.insert(name.to_string(), script);
        self
    }

    fn budget_sequence(mut self, remaining: &[u32]) -> Self {
        self.budget = remaining.to_vec();
        self
    }
}

#[async_trait]
impl ReleaseSource for ScriptedSource {
    async fn starred_repositories(&self, user: &str) -> RemoteResult<Vec<String>> {
        Ok(self.stars.get(user).cloned().unwrap_or_default())
    }

    async fn latest_release(&self, repository: &str) -> RemoteResult<Option<Release>> {
        match self.repos.get(repository) {
            Some(RepoScript::Release(release)) => Ok(Some(release.clone())),
            Some(RepoScript::Tags(_)) => Ok(None),
            Some(RepoScript::Gone) => Ok(None),
            Some(RepoScript::Failing) => Err(RemoteError::network("connection reset")),
            None => Ok(None),
        }
    }

    async fn tags(&self, repository: &str) -> RemoteResult<Vec<String>> {
        match self.repos.get(repository) {
            Some(RepoScript::Tags(tags)) => {
                Ok(tags.iter().map(|(name, _)| name.clone()).collect())
            }
            Some(RepoScript::Gone) => Err(RemoteError::gone(repository)),
            Some(RepoScript::Failing) => Err(RemoteError::network("connection reset")),
            _ => Ok(Vec::new()),
        }
    }

    async fn tag_metadata(&self, repository: &str, tag: &str) -> RemoteResult<TagMetadata> {
        match self.repos.get(repository) {
            Some(RepoScript::Tags(tags)) => tags
                .iter()
                .find(|(name, _)| name == tag)
                .map(|(_, meta)| *meta)
                .ok_or_else(|| RemoteError::api(format!("unknown tag {tag}"))),
            _ => Err(RemoteError::api("no tags scripted")),
        }
    }

    async fn rate_budget(&self) -> RemoteResult<RateBudget> {
        let n = self.budget_calls.fetch_add(1, Ordering::SeqCst) as usize;
        let idx = n.min(self.budget.len() - 1);
        Ok(RateBudget {
            limit: 5000,
            remaining: self.budget[idx],
            reset_at: Utc::now(),
        })
    }
}

fn heavyweight(d: DateTime<Utc>) -> TagMetadata {
    TagMetadata {
        tagger_date: Some(d),
        committer_date: None,
    }
}

fn lightweight(d: DateTime<Utc>) -> TagMetadata {
    TagMetadata {
        tagger_date: None,
        committer_date: Some(d),
    }
}

/// The acme/widget scenario: no releases, a heavyweight and a lightweight
/// tag, newest-first.
fn acme_widget_source() -> ScriptedSource {
    ScriptedSource::new().star("gaul", &["acme/widget"]).repo(
        "acme/widget",
        RepoScript::Tags(vec![
            ("v2.0".to_string(), heavyweight(date(2023, 2, 1))),
            ("v1.0".to_string(), lightweight(date(2022, 1, 1))),
        ]),
    )
}

/// Run the scenario against any store and assert the expected outcome.
async fn run_acme_widget_scenario<T>(store: &T) -> Result<(), SyncError>
where
    T: StarStore + VersionStore,
{
    let source = acme_widget_source();
    let gate = BudgetGate::default();

    sync::sync_stars(&source, store, "gaul").await?;
    let pass = tokio::time::timeout(
        TEST_TIMEOUT,
        sync::fetch_all(&source, store, store, &gate, None),
    )
    .await
    .expect("fetch pass should not hang")?;

    assert_eq!(pass.processed, 1);
    assert_eq!(pass.discovered, 2);
    assert!(pass.errors.is_empty());

    let versions = store.existing_versions("acme/widget").await?;
    assert_eq!(versions.len(), 2);
    assert!(versions.contains("v2.0") && versions.contains("v1.0"));

    let v2 = store
        .latest_for_repository("acme/widget")
        .await?
        .expect("latest record expected");
    assert_eq!(v2.version, "v2.0");
    assert_eq!(v2.created_at, date(2023, 2, 1));

    let view = sync::latest_versions(store, store, "gaul", SortOrder::Ascending).await?;
    assert!(view.is_complete());
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].repository, "acme/widget");
    assert_eq!(view.rows[0].version, "v2.0");
    assert_eq!(view.rows[0].created_at, date(2023, 2, 1));

    Ok(())
}

#[tokio::test]
async fn acme_widget_scenario_on_sql() {
    let store = SqlStore::connect("sqlite::memory:").await.unwrap();
    run_acme_widget_scenario(&store).await.unwrap();
}

#[tokio::test]
async fn acme_widget_scenario_on_kv() {
    let dir = tempfile::tempdir().unwrap();
    let store = KvStore::open(dir.path().join("starwatch.redb"))
        .await
        .unwrap();
    run_acme_widget_scenario(&store).await.unwrap();
}

#[tokio::test]
async fn a_failing_repository_does_not_abort_the_pass() {
    let store = SqlStore::connect("sqlite::memory:").await.unwrap();
    let source = ScriptedSource::new()
        .star("gaul", &["bad/apple", "good/egg"])
        .repo("bad/apple", RepoScript::Failing)
        .repo(
            "good/egg",
            RepoScript::Release(Release {
                tag: "v1.0".to_string(),
                published_at: date(2023, 6, 1),
                url: None,
            }),
        );

    sync::sync_stars(&source, &store, "gaul").await.unwrap();
    let pass = sync::fetch_all(&source, &store, &store, &BudgetGate::default(), None)
        .await
        .unwrap();

    assert_eq!(pass.processed, 2);
    assert_eq!(pass.discovered, 1);
    assert_eq!(pass.errors.len(), 1);
    assert!(pass.errors[0].contains("bad/apple"));

    // The healthy repository still landed.
    let versions = store.existing_versions("good/egg").await.unwrap();
    assert!(versions.contains("v1.0"));
}

#[tokio::test]
async fn a_gone_repository_is_skipped_and_its_history_kept() {
    let store = SqlStore::connect("sqlite::memory:").await.unwrap();

    // First pass: the repository exists and has a release.
    let source = ScriptedSource::new().star("gaul", &["acme/widget"]).repo(
        "acme/widget",
        RepoScript::Release(Release {
            tag: "v1.0".to_string(),
            published_at: date(2023, 1, 1),
            url: None,
        }),
    );
    sync::sync_stars(&source, &store, "gaul").await.unwrap();
    sync::fetch_all(&source, &store, &store, &BudgetGate::default(), None)
        .await
        .unwrap();

    // Second pass: the repository vanished remotely.
    let source = ScriptedSource::new()
        .star("gaul", &["acme/widget"])
        .repo("acme/widget", RepoScript::Gone);
    let pass = sync::fetch_all(&source, &store, &store, &BudgetGate::default(), None)
        .await
        .unwrap();

    assert_eq!(pass.skipped_gone, 1);
    assert!(pass.errors.is_empty());
    let versions = store.existing_versions("acme/widget").await.unwrap();
    assert!(versions.contains("v1.0"));
}

#[tokio::test(start_paused = true)]
async fn the_gate_parks_the_pass_until_budget_recovers() {
    let store = SqlStore::connect("sqlite::memory:").await.unwrap();
    let source = ScriptedSource::new()
        .star("gaul", &["acme/widget"])
        .repo(
            "acme/widget",
            RepoScript::Release(Release {
                tag: "v1.0".to_string(),
                published_at: date(2023, 1, 1),
                url: None,
            }),
        )
        .budget_sequence(&[100, 100, 3000]);

    sync::sync_stars(&source, &store, "gaul").await.unwrap();

    let gate = BudgetGate::new(1000).with_pause(Duration::from_secs(60));
    let pass = sync::fetch_all(&source, &store, &store, &gate, None)
        .await
        .unwrap();

    assert_eq!(pass.discovered, 1);
    // Two parked readings before the third cleared the threshold.
    assert_eq!(source.budget_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn restarring_after_unstar_finds_history_intact() {
    let store = SqlStore::connect("sqlite::memory:").await.unwrap();
    let gate = BudgetGate::default();

    let source = acme_widget_source();
    sync::sync_stars(&source, &store, "gaul").await.unwrap();
    sync::fetch_all(&source, &store, &store, &gate, None)
        .await
        .unwrap();

    // Unstar everything; history must survive.
    let empty = ScriptedSource::new().star("gaul", &[]);
    sync::sync_stars(&empty, &store, "gaul").await.unwrap();
    assert!(store.current_stars("gaul").await.unwrap().is_empty());
    assert_eq!(
        store.existing_versions("acme/widget").await.unwrap().len(),
        2
    );

    // Re-star: the next pass has nothing new to record.
    let source = acme_widget_source();
    sync::sync_stars(&source, &store, "gaul").await.unwrap();
    let pass = sync::fetch_all(&source, &store, &store, &gate, None)
        .await
        .unwrap();
    assert_eq!(pass.discovered, 0);

    let view = sync::latest_versions(&store, &store, "gaul", SortOrder::Descending)
        .await
        .unwrap();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].version, "v2.0");
}

#[tokio::test]
async fn store_failure_surfaces_instead_of_being_masked() {
    // A closed database makes every store call fail.
    let store = SqlStore::from_connection(sea_orm::DatabaseConnection::Disconnected);
    let source = acme_widget_source();

    let err = sync::fetch_all(&source, &store, &store, &BudgetGate::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::Database(_))));
}
