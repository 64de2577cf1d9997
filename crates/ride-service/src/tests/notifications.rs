//! Inbox dispatch and read state.

use ride_core::notification::NotificationKind;
use uuid::Uuid;

use super::{at, harness};
use crate::Error;

#[tokio::test]
async fn dispatch_adds_unread_and_never_deduplicates() {
  let h = harness().await;
  let user = Uuid::new_v4();
  let trip = Uuid::new_v4();
  let n = &h.market.notifications;

  n.dispatch(user, NotificationKind::TripUpdated, "Trip updated", "same", trip)
    .await
    .unwrap();
  n.dispatch(user, NotificationKind::TripUpdated, "Trip updated", "same", trip)
    .await
    .unwrap();

  assert_eq!(n.unread_count(user).await.unwrap(), 2);
  assert_eq!(n.for_user(user).await.unwrap().len(), 2);
  assert_eq!(n.unread_count(Uuid::new_v4()).await.unwrap(), 0);
}

#[tokio::test]
async fn inbox_is_newest_first() {
  let h = harness().await;
  let user = Uuid::new_v4();
  let n = &h.market.notifications;

  let older = n
    .dispatch(user, NotificationKind::TripUpdated, "a", "a", Uuid::new_v4())
    .await
    .unwrap();
  h.clock.set(at("2025-01-02", "12:00"));
  let newer = n
    .dispatch(user, NotificationKind::TripDeleted, "b", "b", Uuid::new_v4())
    .await
    .unwrap();

  let inbox = n.for_user(user).await.unwrap();
  assert_eq!(inbox[0].notification_id, newer.notification_id);
  assert_eq!(inbox[1].notification_id, older.notification_id);
}

#[tokio::test]
async fn read_state_toggles_and_badge_follows() {
  let h = harness().await;
  let user = Uuid::new_v4();
  let n = &h.market.notifications;
  let first = n
    .dispatch(user, NotificationKind::TripUpdated, "a", "a", Uuid::new_v4())
    .await
    .unwrap();
  n.dispatch(user, NotificationKind::TripUpdated, "b", "b", Uuid::new_v4())
    .await
    .unwrap();

  let read = n.mark_read(user, first.notification_id).await.unwrap();
  assert!(read.read);
  assert_eq!(n.unread_count(user).await.unwrap(), 1);

  // Marking an already-read notification read again writes nothing.
  let version = h.market.repository.notifications(user).await.unwrap().version;
  n.mark_read(user, first.notification_id).await.unwrap();
  assert_eq!(
    h.market.repository.notifications(user).await.unwrap().version,
    version
  );

  let unread = n.mark_unread(user, first.notification_id).await.unwrap();
  assert!(!unread.read);
  assert_eq!(n.unread_count(user).await.unwrap(), 2);

  assert_eq!(n.mark_all_read(user).await.unwrap(), 2);
  assert_eq!(n.unread_count(user).await.unwrap(), 0);
  assert_eq!(n.mark_all_read(user).await.unwrap(), 0);
}

#[tokio::test]
async fn marking_unknown_notification_fails() {
  let h = harness().await;
  let err = h
    .market
    .notifications
    .mark_read(Uuid::new_v4(), Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound { entity: "notification", .. }));
}

#[tokio::test]
async fn inboxes_are_per_recipient() {
  let h = harness().await;
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
  let n = &h.market.notifications;
  let sent = n
    .dispatch(a, NotificationKind::TripCancelled, "x", "x", Uuid::new_v4())
    .await
    .unwrap();

  assert_eq!(n.for_user(b).await.unwrap().len(), 0);
  let err = n.mark_read(b, sent.notification_id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
}
