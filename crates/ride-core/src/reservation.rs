//! Reservations — a passenger's claim on seats of a trip.
//!
//! Status moves `pending → confirmed`, and either of those may move to
//! `cancelled`, which is terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trip::Trip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
  Pending,
  Confirmed,
  Cancelled,
}

impl ReservationStatus {
  pub fn is_active(self) -> bool { !matches!(self, Self::Cancelled) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
  pub reservation_id: Uuid,
  pub trip_id:        Uuid,
  pub passenger_id:   Uuid,
  pub status:         ReservationStatus,
  /// Seats held by this reservation.
  #[serde(default = "one_seat")]
  pub seat_count:     u32,
  /// Per-seat price at booking time; may diverge from the trip's current
  /// price.
  pub price:          f64,
  pub cancel_reason:  Option<String>,
  pub created_at:     DateTime<Utc>,
}

fn one_seat() -> u32 { 1 }

impl Reservation {
  /// A new pending reservation priced at the trip's current per-seat price.
  pub fn pending(
    trip: &Trip,
    passenger_id: Uuid,
    seat_count: u32,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      reservation_id: Uuid::new_v4(),
      trip_id: trip.trip_id,
      passenger_id,
      status: ReservationStatus::Pending,
      seat_count,
      price: trip.price,
      cancel_reason: None,
      created_at,
    }
  }

  /// The reservation implied by a legacy passenger entry that has no record
  /// of its own: confirmed, one seat, at the trip's current price.
  pub fn implicit(trip: &Trip, passenger_id: Uuid) -> Self {
    Self {
      reservation_id: implicit_id(trip.trip_id, passenger_id),
      trip_id: trip.trip_id,
      passenger_id,
      status: ReservationStatus::Confirmed,
      seat_count: 1,
      price: trip.price,
      cancel_reason: None,
      created_at: trip.created_at,
    }
  }

  pub fn is_active(&self) -> bool { self.status.is_active() }

  /// Total owed for every seat held.
  pub fn total(&self) -> f64 { self.price * f64::from(self.seat_count) }

  pub fn cancel(&mut self, reason: Option<String>) {
    self.status = ReservationStatus::Cancelled;
    self.cancel_reason = reason;
  }
}

/// Stable id for an implicit reservation, so that it can be addressed (and
/// cancelled) before a record for it exists.
pub fn implicit_id(trip_id: Uuid, passenger_id: Uuid) -> Uuid {
  Uuid::new_v5(&trip_id, passenger_id.as_bytes())
}
