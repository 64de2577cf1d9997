//! The `CollectionStore` trait — the persistence boundary.
//!
//! The store is a key-value map from [`CollectionKey`] to one encoded blob per
//! collection. It knows nothing about the entities inside a blob; typed
//! access lives in the service layer's repository. Every blob carries a
//! [`Version`] that increases by one on each successful commit, and a commit
//! only succeeds against the version the caller last read.

use std::{fmt, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Keys ────────────────────────────────────────────────────────────────────

/// The named collections persisted by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
  /// The signed-in user, or nothing.
  CurrentUser,
  /// The user directory.
  Users,
  Trips,
  Reservations,
  /// One notification inbox per recipient.
  Notifications(Uuid),
}

impl fmt::Display for CollectionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::CurrentUser => f.write_str("currentUser"),
      Self::Users => f.write_str("users"),
      Self::Trips => f.write_str("trips"),
      Self::Reservations => f.write_str("reservations"),
      Self::Notifications(user_id) => write!(f, "notifications:{user_id}"),
    }
  }
}

// ─── Versions ────────────────────────────────────────────────────────────────

/// Monotonic per-collection write counter. A collection that has never been
/// written is at [`Version::INITIAL`].
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
pub struct Version(u64);

impl Version {
  pub const INITIAL: Self = Self(0);

  pub fn new(value: u64) -> Self { Self(value) }

  pub fn get(self) -> u64 { self.0 }

  pub fn next(self) -> Self { Self(self.0 + 1) }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "v{}", self.0)
  }
}

/// An encoded collection as last committed.
#[derive(Debug, Clone)]
pub struct StoredBlob {
  pub version:    Version,
  pub body:       String,
  pub updated_at: DateTime<Utc>,
}

/// Outcome of [`CollectionStore::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
  /// The blob was replaced; this is its new version.
  Applied(Version),
  /// Another writer committed first. Nothing was written.
  Stale { current: Version },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a persisted collection store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CollectionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the blob stored under `key`. Returns `None` if it was never
  /// written.
  fn load(
    &self,
    key: CollectionKey,
  ) -> impl Future<Output = Result<Option<StoredBlob>, Self::Error>> + Send + '_;

  /// Replace the blob under `key` with `body`, provided its current version
  /// is still `expected`.
  fn commit(
    &self,
    key: CollectionKey,
    expected: Version,
    body: String,
  ) -> impl Future<Output = Result<Commit, Self::Error>> + Send + '_;
}
