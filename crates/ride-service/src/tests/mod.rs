//! Tests for the service layer against an in-memory SQLite store.

mod notifications;
mod repository;

use std::{
  collections::VecDeque,
  future::Future,
  pin::Pin,
  sync::{Arc, Mutex},
};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use mockable::Clock;
use ride_core::{
  store::{CollectionKey, CollectionStore, Commit, StoredBlob, Version},
  trip::{NewTrip, Trip},
  user::{Role, User},
};
use ride_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{Marketplace, SharedClock};

// ─── Clock ───────────────────────────────────────────────────────────────────

/// A clock pinned to a local wall-clock time that tests can move.
pub struct FixedClock {
  now: Mutex<NaiveDateTime>,
}

impl FixedClock {
  pub fn set(&self, now: NaiveDateTime) { *self.now.lock().unwrap() = now; }
}

impl Clock for FixedClock {
  fn local(&self) -> DateTime<Local> {
    let now = *self.now.lock().unwrap();
    Local.from_local_datetime(&now).earliest().unwrap()
  }

  fn utc(&self) -> DateTime<Utc> { self.local().with_timezone(&Utc) }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

pub fn time(s: &str) -> NaiveTime {
  NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

pub fn at(d: &str, t: &str) -> NaiveDateTime { date(d).and_time(time(t)) }

// ─── Interleaving store ──────────────────────────────────────────────────────

/// A store operation a queued action can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
  Loaded(CollectionKey),
  Committed(CollectionKey),
}

type Action = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Wraps a [`SqliteStore`] and runs queued actions right after matching
/// operations, simulating another writer acting between two steps of an
/// operation. Actions fire in queue order, each at most once.
pub struct Interleaving {
  pub inner: Arc<SqliteStore>,
  queue:     Mutex<VecDeque<(Event, Action)>>,
}

impl Interleaving {
  pub fn new(inner: Arc<SqliteStore>) -> Self {
    Self { inner, queue: Mutex::new(VecDeque::new()) }
  }

  pub fn after<F, Fut>(&self, event: Event, action: F)
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let boxed: Action =
      Box::new(move || -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(action())
      });
    self.queue.lock().unwrap().push_back((event, boxed));
  }

  /// After `event`, commit `key` again with its current body, as any
  /// unrelated concurrent write would.
  pub fn bump_after(&self, event: Event, key: CollectionKey) {
    let inner = Arc::clone(&self.inner);
    self.after(event, move || async move {
      let blob = inner.load(key).await.unwrap();
      let (version, body) = match blob {
        Some(blob) => (blob.version, blob.body),
        None => (Version::INITIAL, "[]".to_owned()),
      };
      let commit = inner.commit(key, version, body).await.unwrap();
      assert!(matches!(commit, Commit::Applied(_)));
    });
  }

  pub fn pending(&self) -> usize { self.queue.lock().unwrap().len() }

  fn next_action(&self, event: Event) -> Option<Action> {
    let mut queue = self.queue.lock().unwrap();
    match queue.front() {
      Some((next, _)) if *next == event => queue.pop_front().map(|(_, a)| a),
      _ => None,
    }
  }
}

impl CollectionStore for Interleaving {
  type Error = ride_store_sqlite::Error;

  async fn load(
    &self,
    key: CollectionKey,
  ) -> Result<Option<StoredBlob>, Self::Error> {
    let blob = self.inner.load(key).await?;
    if let Some(action) = self.next_action(Event::Loaded(key)) {
      action().await;
    }
    Ok(blob)
  }

  async fn commit(
    &self,
    key: CollectionKey,
    expected: Version,
    body: String,
  ) -> Result<Commit, Self::Error> {
    let outcome = self.inner.commit(key, expected, body).await?;
    if matches!(outcome, Commit::Applied(_))
      && let Some(action) = self.next_action(Event::Committed(key))
    {
      action().await;
    }
    Ok(outcome)
  }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

pub struct Harness<S = SqliteStore> {
  pub market: Marketplace<S>,
  pub store:  Arc<S>,
  pub clock:  Arc<FixedClock>,
  pub driver: User,
}

async fn build<S: CollectionStore>(store: Arc<S>) -> Harness<S> {
  let clock = Arc::new(FixedClock { now: Mutex::new(at("2025-01-01", "12:00")) });
  let market = Marketplace::new(Arc::clone(&store), clock.clone() as SharedClock);
  let driver = market.users.register("Dana", Role::Driver).await.unwrap();
  Harness { market, store, clock, driver }
}

/// A fresh marketplace with one registered driver, with the clock at
/// 2025-01-01 12:00 local time.
pub async fn harness() -> Harness {
  build(Arc::new(SqliteStore::open_in_memory().await.unwrap())).await
}

/// Like [`harness`], over an [`Interleaving`] store.
pub async fn interleaving_harness() -> Harness<Interleaving> {
  let inner = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  build(Arc::new(Interleaving::new(inner))).await
}

impl Harness<Interleaving> {
  /// A second marketplace on the same data that bypasses the queued actions,
  /// standing in for another client.
  pub fn other_client(&self) -> Marketplace<SqliteStore> {
    Marketplace::new(Arc::clone(&self.store.inner), self.clock.clone() as SharedClock)
  }
}

impl<S: CollectionStore> Harness<S> {
  pub async fn passenger(&self, name: &str) -> User {
    self.market.users.register(name, Role::Passenger).await.unwrap()
  }

  /// Publish an A → B trip for the harness driver.
  pub async fn publish(&self, d: &str, t: &str, seats: u32) -> Trip {
    let input = NewTrip::new(self.driver.user_id, "A", "B", date(d), time(t), seats);
    self.market.trips.publish(input).await.unwrap()
  }

  /// Overwrite a trip's legacy passenger list directly in the store, as data
  /// written before reservation records existed would look.
  pub async fn set_legacy_passengers(&self, trip_id: Uuid, passengers: Vec<Uuid>) {
    let mut trips = self.market.repository.trips().await.unwrap();
    let trip = trips.value.iter_mut().find(|t| t.trip_id == trip_id).unwrap();
    trip.passengers = passengers;
    self
      .market
      .repository
      .save_trips(trips.version, &trips.value)
      .await
      .unwrap();
  }

  pub async fn inbox_len(&self, user_id: Uuid) -> usize {
    self.market.notifications.for_user(user_id).await.unwrap().len()
  }
}
