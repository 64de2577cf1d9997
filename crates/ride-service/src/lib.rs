//! The trip and reservation consistency layer.
//!
//! Every manager here works against an injected [`Repository`] over any
//! [`CollectionStore`] backend, and reads the time from an injected
//! [`mockable::Clock`]. Consumers normally build the whole layer at once with
//! [`Marketplace::new`].
//!
//! ```rust,ignore
//! let store = Arc::new(SqliteStore::open("ride.db").await?);
//! let market = Marketplace::new(store, Arc::new(DefaultClock));
//! let trip = market.trips.publish(new_trip).await?;
//! ```

pub mod error;
pub mod notifications;
pub mod repository;
pub mod reservations;
pub mod search;
pub mod trips;
pub mod users;

use std::sync::Arc;

use chrono::NaiveDateTime;
use mockable::Clock;
use ride_core::store::CollectionStore;

pub use error::{Error, Result};
pub use notifications::NotificationDispatcher;
pub use repository::{Repository, Snapshot};
pub use reservations::{ReservationListing, ReservationManager};
pub use search::SearchEngine;
pub use trips::TripManager;
pub use users::UserDirectory;

/// The clock shared by every manager.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Local wall-clock time; trip schedules are local.
pub(crate) fn local_now(clock: &SharedClock) -> NaiveDateTime {
  clock.local().naive_local()
}

/// All managers over one store and one clock.
pub struct Marketplace<S> {
  pub repository:    Repository<S>,
  pub users:         UserDirectory<S>,
  pub trips:         TripManager<S>,
  pub reservations:  ReservationManager<S>,
  pub notifications: NotificationDispatcher<S>,
  pub search:        SearchEngine<S>,
}

impl<S: CollectionStore> Marketplace<S> {
  pub fn new(store: Arc<S>, clock: SharedClock) -> Self {
    let repository = Repository::new(store);
    let notifications =
      NotificationDispatcher::new(repository.clone(), Arc::clone(&clock));

    Self {
      users: UserDirectory::new(repository.clone()),
      trips: TripManager::new(
        repository.clone(),
        notifications.clone(),
        Arc::clone(&clock),
      ),
      reservations: ReservationManager::new(
        repository.clone(),
        Arc::clone(&clock),
      ),
      search: SearchEngine::new(repository.clone(), clock),
      notifications,
      repository,
    }
  }
}

#[cfg(test)]
mod tests;
