//! Reconciliation between reservation records and legacy passenger lists.
//!
//! A booking exists either as an explicit [`Reservation`] record or, for data
//! written before records existed, as a bare id in [`Trip::passengers`]. The
//! record is authoritative: a passenger entry only stands for a booking when
//! no record for that passenger and trip exists, in which case it is read as
//! an implicit confirmed one-seat reservation.
//!
//! Seat accounting always goes through [`bookings`]; the passenger list is a
//! projection rebuilt with [`passenger_projection`] and never counted on its
//! own.

use uuid::Uuid;

use crate::{reservation::Reservation, trip::Trip};

/// Every booking for `trip`: explicit records (any status) followed by the
/// implicit reservations of unrecorded passenger entries.
pub fn bookings(trip: &Trip, reservations: &[Reservation]) -> Vec<Reservation> {
  let mut out: Vec<Reservation> = reservations
    .iter()
    .filter(|r| r.trip_id == trip.trip_id)
    .cloned()
    .collect();

  let mut implicit: Vec<Reservation> = Vec::new();
  for passenger_id in &trip.passengers {
    let recorded = out.iter().any(|r| r.passenger_id == *passenger_id);
    let repeated = implicit.iter().any(|r| r.passenger_id == *passenger_id);
    if !recorded && !repeated {
      implicit.push(Reservation::implicit(trip, *passenger_id));
    }
  }

  out.extend(implicit);
  out
}

/// Bookings for `trip` that still hold seats.
pub fn active_bookings(
  trip: &Trip,
  reservations: &[Reservation],
) -> Vec<Reservation> {
  let mut all = bookings(trip, reservations);
  all.retain(Reservation::is_active);
  all
}

pub fn seats_taken(trip: &Trip, reservations: &[Reservation]) -> u32 {
  active_bookings(trip, reservations)
    .iter()
    .map(|r| r.seat_count)
    .sum()
}

pub fn available_seats(trip: &Trip, reservations: &[Reservation]) -> u32 {
  trip.seats.saturating_sub(seats_taken(trip, reservations))
}

/// The legacy passenger list implied by the active bookings: unique ids in
/// booking order.
pub fn passenger_projection(
  trip: &Trip,
  reservations: &[Reservation],
) -> Vec<Uuid> {
  let mut ids: Vec<Uuid> = Vec::new();
  for booking in active_bookings(trip, reservations) {
    if !ids.contains(&booking.passenger_id) {
      ids.push(booking.passenger_id);
    }
  }
  ids
}

/// Every booking held by `passenger_id` across `trips`, including implicit
/// ones and records whose trip no longer exists.
pub fn passenger_bookings(
  passenger_id: Uuid,
  trips: &[Trip],
  reservations: &[Reservation],
) -> Vec<Reservation> {
  let mut out: Vec<Reservation> = reservations
    .iter()
    .filter(|r| r.passenger_id == passenger_id)
    .cloned()
    .collect();

  for trip in trips {
    let recorded = out.iter().any(|r| r.trip_id == trip.trip_id);
    if !recorded && trip.passengers.contains(&passenger_id) {
      out.push(Reservation::implicit(trip, passenger_id));
    }
  }
  out
}
