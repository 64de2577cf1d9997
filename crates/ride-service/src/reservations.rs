//! Reservations: booking, cancelling and confirming seats.
//!
//! The reservation record is the source of truth for a booking. After every
//! booking write the trip's legacy passenger list is rebuilt from the active
//! bookings, so the two representations cannot drift apart for long; seat
//! counts never rely on the list alone.

use ride_core::{
  bookings,
  reservation::{Reservation, ReservationStatus, implicit_id},
  status::{Tab, reservation_status},
  store::CollectionStore,
  trip::Trip,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result, SharedClock, local_now,
  repository::{Repository, Snapshot},
};

/// A booking as shown in the passenger's reservation list.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationListing {
  pub reservation: Reservation,
  /// `None` once the trip has been deleted.
  pub trip:        Option<Trip>,
  pub tab:         Tab,
}

pub struct ReservationManager<S> {
  repo:  Repository<S>,
  clock: SharedClock,
}

impl<S> Clone for ReservationManager<S> {
  fn clone(&self) -> Self {
    Self { repo: self.repo.clone(), clock: SharedClock::clone(&self.clock) }
  }
}

/// Find a booking by id: an explicit record (with its index), or the
/// implicit reservation behind a legacy passenger entry.
fn locate(
  reservation_id: Uuid,
  trips: &[Trip],
  records: &[Reservation],
) -> Option<(Reservation, Option<usize>)> {
  if let Some(idx) =
    records.iter().position(|r| r.reservation_id == reservation_id)
  {
    return Some((records[idx].clone(), Some(idx)));
  }

  trips.iter().find_map(|trip| {
    trip
      .passengers
      .iter()
      .find(|p| implicit_id(trip.trip_id, **p) == reservation_id)
      .filter(|p| {
        !records
          .iter()
          .any(|r| r.trip_id == trip.trip_id && r.passenger_id == **p)
      })
      .map(|p| (Reservation::implicit(trip, *p), None))
  })
}

/// Rewrite the legacy passenger list of `trip_id` from `records`.
///
/// Runs after the authoritative reservation write has been committed, so it
/// reads the trips fresh and a conflicting trips write is only logged: the
/// projection is repaired by the next booking write on the trip.
pub(crate) async fn sync_passengers<S: CollectionStore>(
  repo: &Repository<S>,
  trip_id: Uuid,
  records: &[Reservation],
) -> Result<()> {
  let Snapshot { version, value: mut trips } = repo.trips().await?;
  let Some(trip) = trips.iter_mut().find(|t| t.trip_id == trip_id) else {
    return Ok(());
  };
  let projection = bookings::passenger_projection(trip, records);
  if projection == trip.passengers {
    return Ok(());
  }
  trip.passengers = projection;

  match repo.save_trips(version, &trips).await {
    Ok(_) => Ok(()),
    Err(err @ Error::Conflict { .. }) => {
      tracing::warn!(%trip_id, error = %err, "passenger list left stale");
      Ok(())
    }
    Err(err) => Err(err),
  }
}

fn upsert(records: &mut Vec<Reservation>, slot: Option<usize>, r: Reservation) {
  match slot {
    Some(idx) => records[idx] = r,
    None => records.push(r),
  }
}

impl<S: CollectionStore> ReservationManager<S> {
  pub fn new(repo: Repository<S>, clock: SharedClock) -> Self {
    Self { repo, clock }
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Book `seat_count` seats on a trip. The reservation starts out pending.
  pub async fn reserve(
    &self,
    trip_id: Uuid,
    passenger_id: Uuid,
    seat_count: u32,
  ) -> Result<Reservation> {
    if seat_count == 0 {
      return Err(ride_core::Error::NoSeatsRequested.into());
    }
    let now = local_now(&self.clock);

    let trips = self.repo.trips().await?;
    let trip = trips
      .value
      .iter()
      .find(|t| t.trip_id == trip_id)
      .ok_or_else(|| Error::not_found("trip", trip_id))?;

    if trip.cancelled {
      return Err(Error::TripCancelled(trip_id));
    }
    if trip.has_started(now) {
      return Err(Error::AlreadyStarted(trip_id));
    }
    if trip.is_managed_by(passenger_id) {
      return Err(Error::Forbidden { trip_id, user_id: passenger_id });
    }

    let Snapshot { version, value: mut records } =
      self.repo.reservations().await?;
    if bookings::active_bookings(trip, &records)
      .iter()
      .any(|b| b.passenger_id == passenger_id)
    {
      return Err(Error::AlreadyBooked { trip_id, passenger_id });
    }

    let available = bookings::available_seats(trip, &records);
    if available < seat_count {
      return Err(Error::CapacityExceeded { requested: seat_count, available });
    }

    // Capacity was checked against this trips version. Re-committing it
    // unchanged fails if the trip was edited since, and makes a concurrent
    // edit fail in turn.
    self.repo.save_trips(trips.version, &trips.value).await?;

    let reservation =
      Reservation::pending(trip, passenger_id, seat_count, self.clock.utc());
    records.push(reservation.clone());
    self.repo.save_reservations(version, &records).await?;
    sync_passengers(&self.repo, trip_id, &records).await?;

    tracing::info!(
      reservation_id = %reservation.reservation_id,
      %trip_id,
      %passenger_id,
      seat_count,
      "reserved seats"
    );
    Ok(reservation)
  }

  /// Cancel a booking, explicit or implicit. Cancelled is terminal.
  pub async fn cancel(
    &self,
    reservation_id: Uuid,
    reason: Option<String>,
  ) -> Result<Reservation> {
    let now = local_now(&self.clock);
    let trips = self.repo.trips().await?.value;
    let Snapshot { version, value: mut records } =
      self.repo.reservations().await?;

    let (mut reservation, slot) = locate(reservation_id, &trips, &records)
      .ok_or_else(|| Error::not_found("reservation", reservation_id))?;
    if !reservation.is_active() {
      return Err(Error::AlreadyCancelled(reservation_id));
    }

    if trips
      .iter()
      .any(|t| t.trip_id == reservation.trip_id && t.has_started(now))
    {
      return Err(Error::AlreadyStarted(reservation.trip_id));
    }

    reservation.cancel(reason);
    upsert(&mut records, slot, reservation.clone());
    self.repo.save_reservations(version, &records).await?;
    sync_passengers(&self.repo, reservation.trip_id, &records).await?;

    tracing::info!(
      %reservation_id,
      trip_id = %reservation.trip_id,
      reason = reservation.cancel_reason.as_deref().unwrap_or(""),
      "cancelled reservation"
    );
    Ok(reservation)
  }

  /// The trip's driver accepts a pending reservation.
  pub async fn confirm(
    &self,
    reservation_id: Uuid,
    requester: Uuid,
  ) -> Result<Reservation> {
    let trips = self.repo.trips().await?.value;
    let Snapshot { version, value: mut records } =
      self.repo.reservations().await?;

    let (mut reservation, slot) = locate(reservation_id, &trips, &records)
      .ok_or_else(|| Error::not_found("reservation", reservation_id))?;
    let trip = trips
      .iter()
      .find(|t| t.trip_id == reservation.trip_id)
      .ok_or_else(|| Error::not_found("trip", reservation.trip_id))?;

    if !trip.is_managed_by(requester) {
      return Err(Error::Forbidden { trip_id: trip.trip_id, user_id: requester });
    }
    match reservation.status {
      ReservationStatus::Cancelled => {
        return Err(Error::AlreadyCancelled(reservation_id));
      }
      ReservationStatus::Confirmed => return Err(Error::NoChange),
      ReservationStatus::Pending => {}
    }

    reservation.status = ReservationStatus::Confirmed;
    upsert(&mut records, slot, reservation.clone());
    self.repo.save_reservations(version, &records).await?;

    tracing::info!(%reservation_id, "confirmed reservation");
    Ok(reservation)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Classify a reservation against the current wall clock.
  pub fn classify(&self, reservation: &Reservation, trip: Option<&Trip>) -> Tab {
    reservation_status(reservation, trip, local_now(&self.clock))
  }

  /// All of a passenger's bookings with their trips and tabs, soonest
  /// departure first; bookings of deleted trips come last.
  pub async fn for_passenger(
    &self,
    passenger_id: Uuid,
  ) -> Result<Vec<ReservationListing>> {
    let now = local_now(&self.clock);
    let trips = self.repo.trips().await?.value;
    let records = self.repo.reservations().await?.value;

    let mut listings: Vec<ReservationListing> =
      bookings::passenger_bookings(passenger_id, &trips, &records)
        .into_iter()
        .map(|reservation| {
          let trip =
            trips.iter().find(|t| t.trip_id == reservation.trip_id).cloned();
          let tab = reservation_status(&reservation, trip.as_ref(), now);
          ReservationListing { reservation, trip, tab }
        })
        .collect();

    listings.sort_by_key(|l| {
      (l.trip.is_none(), l.trip.as_ref().map(Trip::scheduled_at))
    });
    Ok(listings)
  }

  /// Every booking on a trip, cancelled ones included.
  pub async fn for_trip(&self, trip_id: Uuid) -> Result<Vec<Reservation>> {
    let trips = self.repo.trips().await?.value;
    let trip = trips
      .iter()
      .find(|t| t.trip_id == trip_id)
      .ok_or_else(|| Error::not_found("trip", trip_id))?;
    let records = self.repo.reservations().await?.value;
    Ok(bookings::bookings(trip, &records))
  }

  pub async fn available_seats(&self, trip_id: Uuid) -> Result<u32> {
    let trips = self.repo.trips().await?.value;
    let trip = trips
      .iter()
      .find(|t| t.trip_id == trip_id)
      .ok_or_else(|| Error::not_found("trip", trip_id))?;
    let records = self.repo.reservations().await?.value;
    Ok(bookings::available_seats(trip, &records))
  }
}
