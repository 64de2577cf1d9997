//! Error type for `ride-service`.
//!
//! Every rejection a consumer may want to present to a user has its own
//! variant. Backend failures are boxed, since the layer is generic over the
//! store.

use ride_core::store::{CollectionKey, Version};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Invalid(#[from] ride_core::Error),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("user {user_id} may not change trip {trip_id}")]
  Forbidden { trip_id: Uuid, user_id: Uuid },

  #[error("trip {0} has already departed")]
  AlreadyStarted(Uuid),

  #[error("trip {0} has been cancelled")]
  TripCancelled(Uuid),

  #[error("the request changes nothing")]
  NoChange,

  #[error("requested {requested} seat(s) but only {available} available")]
  CapacityExceeded { requested: u32, available: u32 },

  #[error("cannot reduce trip to {seats} seat(s) while {taken} are booked")]
  SeatsBelowOccupancy { seats: u32, taken: u32 },

  #[error("passenger {passenger_id} already holds a seat on trip {trip_id}")]
  AlreadyBooked { trip_id: Uuid, passenger_id: Uuid },

  #[error("reservation {0} is already cancelled")]
  AlreadyCancelled(Uuid),

  #[error("no user is signed in")]
  NotSignedIn,

  /// Another writer committed to the collection after it was read.
  #[error(
    "collection {collection} changed concurrently (read {expected}, now {actual})"
  )]
  Conflict {
    collection: CollectionKey,
    expected:   Version,
    actual:     Version,
  },

  /// The stored blob could not be decoded. Distinct from an empty collection.
  #[error("collection {collection} is corrupt: {source}")]
  Corrupt {
    collection: CollectionKey,
    source:     serde_json::Error,
  },

  #[error("failed to encode collection {collection}: {source}")]
  Encode {
    collection: CollectionKey,
    source:     serde_json::Error,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn not_found(entity: &'static str, id: Uuid) -> Self {
    Self::NotFound { entity, id }
  }

  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
