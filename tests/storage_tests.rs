//! Storage backend tests
//!
//! SeaOrmStorage against temporary SQLite databases.

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database};
use std::sync::Once;
use tempfile::TempDir;

use tokenlink::config::init_config;
use tokenlink::services::{CapacityGuard, SweepOutcome};
use tokenlink::errors::TokenlinkError;
use tokenlink::storage::backend::SeaOrmStorage;
use tokenlink::storage::{Link, LinkStore};
use tokenlink::visits::VisitSink;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    let (storage, _, temp_dir) = create_temp_storage_with_url().await;
    (storage, temp_dir)
}

async fn create_temp_storage_with_url() -> (SeaOrmStorage, String, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (storage, db_url, temp_dir)
}

/// Insert `n` links `bulk1..bulkN` dated 2020, in one statement.
///
/// Goes through a second connection so the rows never pass through
/// `LinkStore::insert`.
async fn seed_bulk_links(db_url: &str, n: u64) {
    let db = Database::connect(db_url).await.expect("seed connection");
    db.execute_unprepared(&format!(
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < {n}) \
         INSERT INTO links (short_code, destination, token, created_at, visits) \
         SELECT 'bulk' || n, 'https://bulk.test', 'bulk', \
                strftime('%Y-%m-%dT%H:%M:%S+00:00', '2020-01-01', '+' || n || ' seconds'), 0 \
         FROM seq"
    ))
    .await
    .expect("seed bulk links");
    db.close().await.expect("close seed connection");
}

/// Link created `age_secs` seconds ago
fn aged_link(code: &str, token: &str, age_secs: i64) -> Link {
    let mut link = Link::new(code, format!("https://{}.example.com", code), token);
    link.created_at = Utc::now() - Duration::seconds(age_secs);
    link
}

#[tokio::test]
async fn test_insert_and_find() {
    let (storage, _dir) = create_temp_storage().await;

    storage
        .insert(&Link::new("abc", "https://x.test", "t1"))
        .await
        .unwrap();

    let found = storage.find_by_code("abc").await.unwrap().unwrap();
    assert_eq!(found.destination, "https://x.test");
    assert_eq!(found.token, "t1");
    assert_eq!(found.visits, 0);

    assert!(storage.find_by_code("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_short_codes_are_case_sensitive() {
    let (storage, _dir) = create_temp_storage().await;

    storage
        .insert(&Link::new("Abc", "https://upper.test", "t1"))
        .await
        .unwrap();
    storage
        .insert(&Link::new("abc", "https://lower.test", "t1"))
        .await
        .unwrap();

    let upper = storage.find_by_code("Abc").await.unwrap().unwrap();
    assert_eq!(upper.destination, "https://upper.test");
    assert_eq!(storage.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_insert_is_conflict() {
    let (storage, _dir) = create_temp_storage().await;

    storage
        .insert(&Link::new("abc", "https://x.test", "t1"))
        .await
        .unwrap();
    let err = storage
        .insert(&Link::new("abc", "https://y.test", "t2"))
        .await
        .unwrap_err();
    assert!(matches!(err, TokenlinkError::LinkAlreadyExists(_)));

    let kept = storage.find_by_code("abc").await.unwrap().unwrap();
    assert_eq!(kept.destination, "https://x.test");
    assert_eq!(kept.token, "t1");
}

#[tokio::test]
async fn test_find_by_token_newest_first() {
    let (storage, _dir) = create_temp_storage().await;

    storage.insert(&aged_link("old", "t1", 300)).await.unwrap();
    storage.insert(&aged_link("new", "t1", 10)).await.unwrap();
    storage.insert(&aged_link("mid", "t1", 100)).await.unwrap();
    storage.insert(&aged_link("other", "t2", 5)).await.unwrap();

    let codes: Vec<String> = storage
        .find_by_token("t1")
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.short_code)
        .collect();
    assert_eq!(codes, vec!["new", "mid", "old"]);

    assert!(storage.find_by_token("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_owned_requires_both_code_and_token() {
    let (storage, _dir) = create_temp_storage().await;
    storage
        .insert(&Link::new("abc", "https://x.test", "t1"))
        .await
        .unwrap();

    assert_eq!(storage.delete_owned("abc", "t2").await.unwrap(), 0);
    assert!(storage.find_by_code("abc").await.unwrap().is_some());

    assert_eq!(storage.delete_owned("abc", "t1").await.unwrap(), 1);
    assert!(storage.find_by_code("abc").await.unwrap().is_none());

    assert_eq!(storage.delete_owned("abc", "t1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_evict_oldest_removes_exactly_k() {
    let (storage, _dir) = create_temp_storage().await;

    for (i, code) in ["e", "d", "c", "b", "a"].iter().enumerate() {
        // "e" is the oldest, "a" the newest
        storage
            .insert(&aged_link(code, "t", 500 - (i as i64) * 100))
            .await
            .unwrap();
    }
    assert_eq!(storage.count().await.unwrap(), 5);

    assert_eq!(storage.evict_oldest(2).await.unwrap(), 2);
    assert_eq!(storage.count().await.unwrap(), 3);
    assert!(storage.find_by_code("e").await.unwrap().is_none());
    assert!(storage.find_by_code("d").await.unwrap().is_none());
    assert!(storage.find_by_code("c").await.unwrap().is_some());

    assert_eq!(storage.evict_oldest(0).await.unwrap(), 0);
    assert_eq!(storage.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_evict_oldest_breaks_ties_by_code() {
    let (storage, _dir) = create_temp_storage().await;

    let created_at = Utc::now() - Duration::seconds(60);
    for code in ["b", "a", "c"] {
        let mut link = Link::new(code, "https://x.test", "t");
        link.created_at = created_at;
        storage.insert(&link).await.unwrap();
    }

    storage.evict_oldest(1).await.unwrap();
    assert!(storage.find_by_code("a").await.unwrap().is_none());
    assert!(storage.find_by_code("b").await.unwrap().is_some());
}

#[tokio::test]
async fn test_evict_more_than_stored() {
    let (storage, _dir) = create_temp_storage().await;
    storage.insert(&aged_link("only", "t", 1)).await.unwrap();

    assert_eq!(storage.evict_oldest(10).await.unwrap(), 1);
    assert_eq!(storage.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_evict_oldest_beyond_bind_parameter_limit() {
    let (storage, db_url, _dir) = create_temp_storage_with_url().await;

    // SQLite caps a statement at 32766 bound parameters
    seed_bulk_links(&db_url, 40_000).await;
    for code in ["keep1", "keep2", "keep3"] {
        storage
            .insert(&Link::new(code, "https://keep.test", "t"))
            .await
            .unwrap();
    }
    assert_eq!(storage.count().await.unwrap(), 40_003);

    let guard = CapacityGuard::new(40, 3);
    let outcome = guard.sweep(&storage).await.unwrap();
    assert_eq!(
        outcome,
        SweepOutcome::Evicted {
            count: 40_003,
            evicted: 40_000
        }
    );

    assert_eq!(storage.count().await.unwrap(), 3);
    for code in ["keep1", "keep2", "keep3"] {
        assert!(storage.find_by_code(code).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn test_flush_visits_large_batch() {
    let (storage, db_url, _dir) = create_temp_storage_with_url().await;
    seed_bulk_links(&db_url, 2_500).await;

    let updates: Vec<(String, u64)> = (1..=2_500u64)
        .map(|i| (format!("bulk{}", i), i % 7 + 1))
        .collect();
    storage.flush_visits(updates).await.unwrap();

    assert_eq!(storage.find_by_code("bulk1").await.unwrap().unwrap().visits, 2);
    assert_eq!(storage.find_by_code("bulk1234").await.unwrap().unwrap().visits, 3);
    assert_eq!(storage.find_by_code("bulk2500").await.unwrap().unwrap().visits, 2);
}

#[tokio::test]
async fn test_flush_visits_adds_to_stored_counts() {
    let (storage, _dir) = create_temp_storage().await;
    storage
        .insert(&Link::new("a", "https://a.test", "t"))
        .await
        .unwrap();
    storage
        .insert(&Link::new("b", "https://b.test", "t"))
        .await
        .unwrap();

    storage
        .flush_visits(vec![("a".to_string(), 3), ("b".to_string(), 1)])
        .await
        .unwrap();
    storage
        .flush_visits(vec![("a".to_string(), 2), ("gone".to_string(), 7)])
        .await
        .unwrap();
    storage.flush_visits(Vec::new()).await.unwrap();

    assert_eq!(storage.find_by_code("a").await.unwrap().unwrap().visits, 5);
    assert_eq!(storage.find_by_code("b").await.unwrap().unwrap().visits, 1);
    assert!(storage.find_by_code("gone").await.unwrap().is_none());
}

#[tokio::test]
async fn test_backend_name() {
    let (storage, _dir) = create_temp_storage().await;
    assert_eq!(storage.backend_name(), "sqlite");
}

#[tokio::test]
async fn test_data_survives_reopen() {
    init_test_config();
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("reopen.db").display()
    );

    {
        let storage = SeaOrmStorage::new(&db_url, "sqlite").await.unwrap();
        storage
            .insert(&Link::new("abc", "https://x.test", "t1"))
            .await
            .unwrap();
    }

    let storage = SeaOrmStorage::new(&db_url, "sqlite").await.unwrap();
    assert!(storage.find_by_code("abc").await.unwrap().is_some());
}
