//! Error types for `ride-core`.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Validation failures raised by the pure rules in this crate.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("a trip needs at least one seat")]
  NoSeats,

  #[error("price must be a finite, non-negative amount")]
  InvalidPrice,

  #[error("departure {0} is in the past")]
  DepartureInPast(NaiveDateTime),

  #[error("a reservation needs at least one seat")]
  NoSeatsRequested,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
