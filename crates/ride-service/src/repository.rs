//! Typed accessors over a [`CollectionStore`].
//!
//! Each read returns the decoded collection together with the version it was
//! read at; each write takes that version back and fails with
//! [`Error::Conflict`] if someone else committed in between. Read, modify in
//! memory, write back is the only supported mutation pattern.

use std::sync::Arc;

use ride_core::{
  notification::Notification,
  reservation::Reservation,
  store::{CollectionKey, CollectionStore, Commit, Version},
  trip::Trip,
  user::User,
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

/// A decoded collection and the version it was read at.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
  pub version: Version,
  pub value:   T,
}

/// Handle to the persisted collections. Cloning shares the underlying store.
pub struct Repository<S> {
  store: Arc<S>,
}

impl<S> Clone for Repository<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: CollectionStore> Repository<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  async fn read<T>(&self, key: CollectionKey) -> Result<Snapshot<T>>
  where
    T: DeserializeOwned + Default,
  {
    let Some(blob) = self.store.load(key).await.map_err(Error::store)? else {
      return Ok(Snapshot { version: Version::INITIAL, value: T::default() });
    };

    let value = serde_json::from_str(&blob.body).map_err(|source| {
      tracing::error!(collection = %key, version = %blob.version, "undecodable collection");
      Error::Corrupt { collection: key, source }
    })?;
    Ok(Snapshot { version: blob.version, value })
  }

  async fn write<T>(
    &self,
    key: CollectionKey,
    expected: Version,
    value: &T,
  ) -> Result<Version>
  where
    T: Serialize + ?Sized,
  {
    let body = serde_json::to_string(value)
      .map_err(|source| Error::Encode { collection: key, source })?;

    match self
      .store
      .commit(key, expected, body)
      .await
      .map_err(Error::store)?
    {
      Commit::Applied(version) => {
        tracing::debug!(collection = %key, %version, "committed");
        Ok(version)
      }
      Commit::Stale { current } => {
        tracing::warn!(
          collection = %key,
          %expected,
          %current,
          "rejected stale write"
        );
        Err(Error::Conflict { collection: key, expected, actual: current })
      }
    }
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  pub async fn current_user(&self) -> Result<Snapshot<Option<User>>> {
    self.read(CollectionKey::CurrentUser).await
  }

  pub async fn save_current_user(
    &self,
    expected: Version,
    user: Option<&User>,
  ) -> Result<Version> {
    self.write(CollectionKey::CurrentUser, expected, &user).await
  }

  pub async fn users(&self) -> Result<Snapshot<Vec<User>>> {
    self.read(CollectionKey::Users).await
  }

  pub async fn save_users(
    &self,
    expected: Version,
    users: &[User],
  ) -> Result<Version> {
    self.write(CollectionKey::Users, expected, users).await
  }

  // ── Trips ─────────────────────────────────────────────────────────────────

  pub async fn trips(&self) -> Result<Snapshot<Vec<Trip>>> {
    self.read(CollectionKey::Trips).await
  }

  pub async fn save_trips(
    &self,
    expected: Version,
    trips: &[Trip],
  ) -> Result<Version> {
    self.write(CollectionKey::Trips, expected, trips).await
  }

  // ── Reservations ──────────────────────────────────────────────────────────

  pub async fn reservations(&self) -> Result<Snapshot<Vec<Reservation>>> {
    self.read(CollectionKey::Reservations).await
  }

  pub async fn save_reservations(
    &self,
    expected: Version,
    reservations: &[Reservation],
  ) -> Result<Version> {
    self
      .write(CollectionKey::Reservations, expected, reservations)
      .await
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  pub async fn notifications(
    &self,
    user_id: Uuid,
  ) -> Result<Snapshot<Vec<Notification>>> {
    self.read(CollectionKey::Notifications(user_id)).await
  }

  pub async fn save_notifications(
    &self,
    user_id: Uuid,
    expected: Version,
    notifications: &[Notification],
  ) -> Result<Version> {
    self
      .write(CollectionKey::Notifications(user_id), expected, notifications)
      .await
  }
}
