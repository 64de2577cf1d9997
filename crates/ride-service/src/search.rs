//! Trip search over the persisted collections.

use ride_core::{
  search::{self, TripListing, TripQuery},
  store::CollectionStore,
};

use crate::{Result, SharedClock, local_now, repository::Repository};

pub struct SearchEngine<S> {
  repo:  Repository<S>,
  clock: SharedClock,
}

impl<S> Clone for SearchEngine<S> {
  fn clone(&self) -> Self {
    Self { repo: self.repo.clone(), clock: SharedClock::clone(&self.clock) }
  }
}

impl<S: CollectionStore> SearchEngine<S> {
  pub fn new(repo: Repository<S>, clock: SharedClock) -> Self {
    Self { repo, clock }
  }

  /// Trips matching `query`, with availability computed from bookings and
  /// ratings joined from the user directory.
  pub async fn search(&self, query: &TripQuery) -> Result<Vec<TripListing>> {
    let trips = self.repo.trips().await?.value;
    let reservations = self.repo.reservations().await?.value;
    let users = self.repo.users().await?.value;

    let found = search::search(
      trips,
      &reservations,
      &users,
      query,
      local_now(&self.clock),
    );
    tracing::debug!(?query, results = found.len(), "searched trips");
    Ok(found)
  }
}
