//! Versioned reads and writes through the repository.

use ride_core::store::{CollectionKey, CollectionStore, Commit, Version};
use uuid::Uuid;

use super::harness;
use crate::Error;

#[tokio::test]
async fn absent_collections_read_as_empty() {
  let h = harness().await;
  let trips = h.market.repository.trips().await.unwrap();
  assert_eq!(trips.version, Version::INITIAL);
  assert!(trips.value.is_empty());

  let inbox = h.market.repository.notifications(Uuid::new_v4()).await.unwrap();
  assert!(inbox.value.is_empty());
  assert!(h.market.users.current().await.unwrap().is_none());
}

#[tokio::test]
async fn undecodable_collection_is_corrupt_not_empty() {
  let h = harness().await;
  let commit = h
    .store
    .commit(CollectionKey::Trips, Version::INITIAL, "{oops".into())
    .await
    .unwrap();
  assert!(matches!(commit, Commit::Applied(_)));

  let err = h.market.trips.all().await.unwrap_err();
  assert!(matches!(
    err,
    Error::Corrupt { collection: CollectionKey::Trips, .. }
  ));

  // Writes built on the corrupt read never happen.
  let err = h.market.search.search(&Default::default()).await.unwrap_err();
  assert!(matches!(err, Error::Corrupt { .. }));
}

#[tokio::test]
async fn stale_write_is_a_conflict() {
  let h = harness().await;
  let snapshot = h.market.repository.users().await.unwrap();
  assert_eq!(snapshot.value.len(), 1);

  // Someone else commits first.
  h.passenger("Pat").await;

  let err = h
    .market
    .repository
    .save_users(snapshot.version, &snapshot.value)
    .await
    .unwrap_err();
  match err {
    Error::Conflict { collection, expected, actual } => {
      assert_eq!(collection, CollectionKey::Users);
      assert_eq!(expected, snapshot.version);
      assert_eq!(actual, snapshot.version.next());
    }
    other => panic!("expected conflict, got {other:?}"),
  }

  // The concurrent write survived.
  assert_eq!(h.market.users.all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn every_write_bumps_the_version() {
  let h = harness().await;
  let before = h.market.repository.trips().await.unwrap().version;
  h.publish("2025-01-10", "08:00", 1).await;
  let after = h.market.repository.trips().await.unwrap().version;
  assert_eq!(after, before.next());
}

#[tokio::test]
async fn session_round_trips() {
  let h = harness().await;
  let err = h.market.users.require_current().await.unwrap_err();
  assert!(matches!(err, Error::NotSignedIn));

  h.market.users.sign_in(h.driver.user_id).await.unwrap();
  let me = h.market.users.require_current().await.unwrap();
  assert_eq!(me.user_id, h.driver.user_id);

  h.market.users.sign_out().await.unwrap();
  assert!(h.market.users.current().await.unwrap().is_none());

  let err = h.market.users.sign_in(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { entity: "user", .. }));
}
