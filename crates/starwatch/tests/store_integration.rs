//! Storage contract tests through the URL-selected `Store` facade.
//!
//! The per-backend unit tests live with each backend; these exercise the
//! same contract through `Store::open`, the way the CLI reaches it.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};

use starwatch::store::{LatestStrategy, StarStore, Store, VersionEntry, VersionStore};

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn entry(version: &str, d: DateTime<Utc>) -> VersionEntry {
    VersionEntry {
        version: version.to_string(),
        created_at: d,
    }
}

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The backend-independent storage contract.
async fn exercise_contract(store: &Store) {
    // Appends are idempotent and keep the first observed date.
    let entries = vec![entry("v1.0", date(2022, 1, 1)), entry("v2.0", date(2023, 2, 1))];
    assert_eq!(store.append_versions("acme/widget", &entries).await.unwrap(), 2);
    assert_eq!(store.append_versions("acme/widget", &entries).await.unwrap(), 0);
    assert_eq!(
        store
            .append_versions("acme/widget", &[entry("v1.0", date(2025, 1, 1))])
            .await
            .unwrap(),
        0
    );

    assert_eq!(
        store.existing_versions("acme/widget").await.unwrap(),
        set_of(&["v1.0", "v2.0"])
    );
    assert!(store.existing_versions("acme/unknown").await.unwrap().is_empty());

    // Latest selection by max created_at.
    let latest = store
        .latest_for_repository("acme/widget")
        .await
        .unwrap()
        .expect("record expected");
    assert_eq!(latest.version, "v2.0");
    assert_eq!(latest.created_at, date(2023, 2, 1));

    // Bulk latest omits repositories without rows.
    store
        .append_versions("acme/gadget", &[entry("r5", date(2021, 3, 1))])
        .await
        .unwrap();
    let repos = vec![
        "acme/widget".to_string(),
        "acme/gadget".to_string(),
        "acme/empty".to_string(),
    ];
    let mut bulk = store.latest_per_repository(&repos).await.unwrap();
    bulk.sort_by(|a, b| a.repository.cmp(&b.repository));
    assert_eq!(bulk.len(), 2);
    assert_eq!(bulk[0].repository, "acme/gadget");
    assert_eq!(bulk[1].repository, "acme/widget");

    // Star membership: diff application and cross-user union.
    store
        .apply_diff("alice", &set_of(&["acme/widget", "shared/repo"]), &BTreeSet::new())
        .await
        .unwrap();
    store
        .apply_diff("bob", &set_of(&["shared/repo"]), &BTreeSet::new())
        .await
        .unwrap();
    assert_eq!(
        store.all_tracked_repositories().await.unwrap(),
        set_of(&["acme/widget", "shared/repo"])
    );

    // Unstar never cascades into version history.
    store
        .apply_diff("alice", &BTreeSet::new(), &set_of(&["acme/widget"]))
        .await
        .unwrap();
    assert_eq!(
        store.current_stars("alice").await.unwrap(),
        set_of(&["shared/repo"])
    );
    assert_eq!(
        store.existing_versions("acme/widget").await.unwrap(),
        set_of(&["v1.0", "v2.0"])
    );
}

#[tokio::test]
async fn sql_backend_honors_the_contract() {
    let store = Store::open("sqlite://:memory:").await.unwrap();
    assert_eq!(store.latest_strategy(), LatestStrategy::Combined);
    exercise_contract(&store).await;
}

#[tokio::test]
async fn kv_backend_honors_the_contract() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("redb://{}", dir.path().join("starwatch.redb").display());
    let store = Store::open(&url).await.unwrap();
    assert_eq!(store.latest_strategy(), LatestStrategy::PartitionedFanOut);
    exercise_contract(&store).await;
}
