//! Notification dispatch and read-state tracking.
//!
//! Each recipient has an inbox collection of their own. Dispatch never
//! deduplicates: the same event dispatched twice yields two records.

use ride_core::{
  notification::{Notification, NotificationKind},
  store::CollectionStore,
};
use uuid::Uuid;

use crate::{Error, Result, SharedClock, repository::Repository};

/// Inbox writes tried before a dispatch gives up.
const DISPATCH_ATTEMPTS: u32 = 3;

pub struct NotificationDispatcher<S> {
  repo:  Repository<S>,
  clock: SharedClock,
}

impl<S> Clone for NotificationDispatcher<S> {
  fn clone(&self) -> Self {
    Self { repo: self.repo.clone(), clock: SharedClock::clone(&self.clock) }
  }
}

impl<S: CollectionStore> NotificationDispatcher<S> {
  pub fn new(repo: Repository<S>, clock: SharedClock) -> Self {
    Self { repo, clock }
  }

  /// Append an unread notification to `user_id`'s inbox.
  pub async fn dispatch(
    &self,
    user_id: Uuid,
    kind: NotificationKind,
    title: impl Into<String>,
    message: impl Into<String>,
    trip_id: Uuid,
  ) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      user_id,
      kind,
      title: title.into(),
      message: message.into(),
      trip_id,
      read: false,
      created_at: self.clock.utc(),
    };

    // Appending never depends on what else is in the inbox, so a concurrent
    // write to it is simply retried on top of the newer version.
    let mut attempt = 1;
    loop {
      let mut inbox = self.repo.notifications(user_id).await?;
      inbox.value.push(notification.clone());
      match self
        .repo
        .save_notifications(user_id, inbox.version, &inbox.value)
        .await
      {
        Ok(_) => break,
        Err(Error::Conflict { .. }) if attempt < DISPATCH_ATTEMPTS => {
          attempt += 1;
        }
        Err(err) => return Err(err),
      }
    }

    tracing::info!(
      %user_id,
      %trip_id,
      kind = ?notification.kind,
      "dispatched notification"
    );
    Ok(notification)
  }

  /// The recipient's notifications, newest first.
  pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
    let mut inbox = self.repo.notifications(user_id).await?.value;
    inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(inbox)
  }

  pub async fn mark_read(
    &self,
    user_id: Uuid,
    notification_id: Uuid,
  ) -> Result<Notification> {
    self.set_read(user_id, notification_id, true).await
  }

  pub async fn mark_unread(
    &self,
    user_id: Uuid,
    notification_id: Uuid,
  ) -> Result<Notification> {
    self.set_read(user_id, notification_id, false).await
  }

  async fn set_read(
    &self,
    user_id: Uuid,
    notification_id: Uuid,
    read: bool,
  ) -> Result<Notification> {
    let mut inbox = self.repo.notifications(user_id).await?;
    let notification = inbox
      .value
      .iter_mut()
      .find(|n| n.notification_id == notification_id)
      .ok_or_else(|| Error::not_found("notification", notification_id))?;

    if notification.read == read {
      return Ok(notification.clone());
    }
    notification.read = read;
    let updated = notification.clone();

    self
      .repo
      .save_notifications(user_id, inbox.version, &inbox.value)
      .await?;
    Ok(updated)
  }

  /// Mark every notification in the inbox read. Returns how many changed.
  pub async fn mark_all_read(&self, user_id: Uuid) -> Result<usize> {
    let mut inbox = self.repo.notifications(user_id).await?;
    let mut changed = 0;
    for n in inbox.value.iter_mut().filter(|n| !n.read) {
      n.read = true;
      changed += 1;
    }

    if changed > 0 {
      self
        .repo
        .save_notifications(user_id, inbox.version, &inbox.value)
        .await?;
    }
    Ok(changed)
  }

  /// Unread notifications for the badge. Always recounted from the store.
  pub async fn unread_count(&self, user_id: Uuid) -> Result<usize> {
    let inbox = self.repo.notifications(user_id).await?;
    Ok(inbox.value.iter().filter(|n| !n.read).count())
  }
}
