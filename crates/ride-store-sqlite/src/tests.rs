//! Integration tests for `SqliteStore` against an in-memory database.

use ride_core::store::{CollectionKey, CollectionStore, Commit, Version};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Load ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_missing_collection_returns_none() {
  let s = store().await;
  let blob = s.load(CollectionKey::Trips).await.unwrap();
  assert!(blob.is_none());
}

#[tokio::test]
async fn commit_then_load_roundtrip() {
  let s = store().await;

  let outcome = s
    .commit(CollectionKey::Trips, Version::INITIAL, "[]".into())
    .await
    .unwrap();
  assert_eq!(outcome, Commit::Applied(Version::new(1)));

  let blob = s.load(CollectionKey::Trips).await.unwrap().unwrap();
  assert_eq!(blob.version, Version::new(1));
  assert_eq!(blob.body, "[]");
}

// ─── Versioning ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn each_commit_advances_version_by_one() {
  let s = store().await;

  let mut version = Version::INITIAL;
  for body in ["[1]", "[1,2]", "[1,2,3]"] {
    match s
      .commit(CollectionKey::Reservations, version, body.into())
      .await
      .unwrap()
    {
      Commit::Applied(v) => {
        assert_eq!(v, version.next());
        version = v;
      }
      Commit::Stale { .. } => panic!("unexpected stale commit"),
    }
  }

  let blob = s.load(CollectionKey::Reservations).await.unwrap().unwrap();
  assert_eq!(blob.version, Version::new(3));
  assert_eq!(blob.body, "[1,2,3]");
}

#[tokio::test]
async fn stale_commit_is_rejected_and_keeps_previous_body() {
  let s = store().await;

  // Two writers read the same (absent) collection.
  let first = s
    .commit(CollectionKey::Trips, Version::INITIAL, "[\"first\"]".into())
    .await
    .unwrap();
  assert_eq!(first, Commit::Applied(Version::new(1)));

  let second = s
    .commit(CollectionKey::Trips, Version::INITIAL, "[\"second\"]".into())
    .await
    .unwrap();
  assert_eq!(second, Commit::Stale { current: Version::new(1) });

  let blob = s.load(CollectionKey::Trips).await.unwrap().unwrap();
  assert_eq!(blob.body, "[\"first\"]");
}

#[tokio::test]
async fn commit_against_future_version_is_stale() {
  let s = store().await;
  let outcome = s
    .commit(CollectionKey::Users, Version::new(5), "[]".into())
    .await
    .unwrap();
  assert_eq!(outcome, Commit::Stale { current: Version::INITIAL });
  assert!(s.load(CollectionKey::Users).await.unwrap().is_none());
}

// ─── Keys ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn notification_inboxes_are_separate_collections() {
  let s = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  s.commit(CollectionKey::Notifications(alice), Version::INITIAL, "[\"a\"]".into())
    .await
    .unwrap();
  s.commit(CollectionKey::Notifications(bob), Version::INITIAL, "[\"b\"]".into())
    .await
    .unwrap();

  let a = s.load(CollectionKey::Notifications(alice)).await.unwrap().unwrap();
  let b = s.load(CollectionKey::Notifications(bob)).await.unwrap().unwrap();
  assert_eq!(a.body, "[\"a\"]");
  assert_eq!(b.body, "[\"b\"]");

  let names = s.collection_names().await.unwrap();
  assert_eq!(names.len(), 2);
  assert!(names.iter().all(|n| n.starts_with("notifications:")));
}

#[tokio::test]
async fn reopening_a_file_store_keeps_collections() {
  let dir = std::env::temp_dir().join(format!("ride-store-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("ride.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.commit(CollectionKey::CurrentUser, Version::INITIAL, "null".into())
      .await
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let blob = s.load(CollectionKey::CurrentUser).await.unwrap().unwrap();
  assert_eq!(blob.version, Version::new(1));
  assert_eq!(blob.body, "null");

  std::fs::remove_dir_all(&dir).ok();
}
