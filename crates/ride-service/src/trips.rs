//! Trip lifecycle: publish, read, edit, delete and cancel.
//!
//! Only the trip's creator (or its driver) may change a trip, and only before
//! its scheduled instant. Both checks run again at commit time even when a
//! caller already ran [`TripManager::check_editable`], since time may have
//! passed in between.

use chrono::NaiveDateTime;
use ride_core::{
  bookings,
  notification::NotificationKind,
  reservation::Reservation,
  status::{Tab, trip_status},
  store::CollectionStore,
  trip::{NewTrip, Trip, TripChange, TripPatch, ensure_departure_ahead},
};
use uuid::Uuid;

use crate::{
  Error, Result, SharedClock, local_now,
  notifications::NotificationDispatcher,
  repository::{Repository, Snapshot},
  reservations::sync_passengers,
};

/// Reservation writes tried before releasing bookings gives up.
const RELEASE_ATTEMPTS: u32 = 3;

pub struct TripManager<S> {
  repo:     Repository<S>,
  notifier: NotificationDispatcher<S>,
  clock:    SharedClock,
}

impl<S> Clone for TripManager<S> {
  fn clone(&self) -> Self {
    Self {
      repo:     self.repo.clone(),
      notifier: self.notifier.clone(),
      clock:    SharedClock::clone(&self.clock),
    }
  }
}

/// Reject a change unless `requester` manages `trip` and it has not departed.
fn authorize(trip: &Trip, requester: Uuid, now: NaiveDateTime) -> Result<()> {
  if !trip.is_managed_by(requester) {
    return Err(Error::Forbidden { trip_id: trip.trip_id, user_id: requester });
  }
  if trip.has_started(now) {
    return Err(Error::AlreadyStarted(trip.trip_id));
  }
  Ok(())
}

fn find_trip(trips: &[Trip], trip_id: Uuid) -> Result<usize> {
  trips
    .iter()
    .position(|t| t.trip_id == trip_id)
    .ok_or_else(|| Error::not_found("trip", trip_id))
}

impl<S: CollectionStore> TripManager<S> {
  pub fn new(
    repo: Repository<S>,
    notifier: NotificationDispatcher<S>,
    clock: SharedClock,
  ) -> Self {
    Self { repo, notifier, clock }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Every stored trip, unfiltered.
  pub async fn all(&self) -> Result<Vec<Trip>> {
    Ok(self.repo.trips().await?.value)
  }

  pub async fn get(&self, trip_id: Uuid) -> Result<Trip> {
    let trips = self.repo.trips().await?.value;
    let idx = find_trip(&trips, trip_id)?;
    Ok(trips[idx].clone())
  }

  /// Classify `trip` against the current wall clock.
  pub fn status(&self, trip: &Trip) -> Tab {
    trip_status(trip, local_now(&self.clock))
  }

  /// The driver's own trips, each with its tab.
  pub async fn driver_trips(&self, driver_id: Uuid) -> Result<Vec<(Trip, Tab)>> {
    let now = local_now(&self.clock);
    let mut mine: Vec<(Trip, Tab)> = self
      .all()
      .await?
      .into_iter()
      .filter(|t| t.is_managed_by(driver_id))
      .map(|t| {
        let tab = trip_status(&t, now);
        (t, tab)
      })
      .collect();
    mine.sort_by_key(|(t, _)| t.scheduled_at());
    Ok(mine)
  }

  /// Run the edit/delete preconditions without changing anything.
  pub async fn check_editable(
    &self,
    trip_id: Uuid,
    requester: Uuid,
  ) -> Result<Trip> {
    let trip = self.get(trip_id).await?;
    authorize(&trip, requester, local_now(&self.clock))?;
    Ok(trip)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  pub async fn publish(&self, input: NewTrip) -> Result<Trip> {
    input.validate(local_now(&self.clock))?;

    let Snapshot { version, value: mut trips } = self.repo.trips().await?;
    let trip = input.into_trip(Uuid::new_v4(), self.clock.utc());
    trips.push(trip.clone());
    self.repo.save_trips(version, &trips).await?;

    tracing::info!(
      trip_id = %trip.trip_id,
      driver_id = %trip.driver_id,
      departs = %trip.scheduled_at(),
      "published trip"
    );
    Ok(trip)
  }

  pub async fn update(
    &self,
    trip_id: Uuid,
    requester: Uuid,
    patch: TripPatch,
  ) -> Result<Trip> {
    let now = local_now(&self.clock);
    let Snapshot { version, value: mut trips } = self.repo.trips().await?;
    let idx = find_trip(&trips, trip_id)?;
    let current = &trips[idx];

    authorize(current, requester, now)?;
    if current.cancelled {
      return Err(Error::TripCancelled(trip_id));
    }

    let changes = patch.changes(current);
    if changes.is_empty() {
      return Err(Error::NoChange);
    }

    let mut edited = current.clone();
    patch.apply(&mut edited);
    edited.validate_fields()?;
    if changes.iter().any(|c| matches!(c, TripChange::Schedule { .. })) {
      ensure_departure_ahead(edited.date, edited.time, now)?;
    }

    let Snapshot { version: booked_at, value: reservations } =
      self.repo.reservations().await?;
    let taken = bookings::seats_taken(&edited, &reservations);
    if edited.seats < taken {
      return Err(Error::SeatsBelowOccupancy { seats: edited.seats, taken });
    }
    if edited.seats < current.seats {
      // The occupancy check only holds for this reservations version; pin it
      // so a booking committed since then turns this edit into a conflict.
      self.repo.save_reservations(booked_at, &reservations).await?;
    }

    edited.updated_at = self.clock.utc();
    trips[idx] = edited.clone();
    self.repo.save_trips(version, &trips).await?;
    tracing::info!(%trip_id, changes = changes.len(), "updated trip");

    let described: Vec<String> =
      changes.iter().filter_map(TripChange::describe).collect();
    if !described.is_empty() {
      let message = format!(
        "Your trip {} was changed: {}.",
        edited.route(),
        described.join("; ")
      );
      for booking in bookings::active_bookings(&edited, &reservations) {
        self
          .notifier
          .dispatch(
            booking.passenger_id,
            NotificationKind::TripUpdated,
            "Trip updated",
            message.clone(),
            trip_id,
          )
          .await?;
      }
    }

    Ok(edited)
  }

  /// Remove a trip, release its bookings and tell each passenger.
  pub async fn delete(&self, trip_id: Uuid, requester: Uuid) -> Result<Trip> {
    let now = local_now(&self.clock);
    let Snapshot { version, value: mut trips } = self.repo.trips().await?;
    let idx = find_trip(&trips, trip_id)?;
    authorize(&trips[idx], requester, now)?;

    let removed = trips.remove(idx);
    self.repo.save_trips(version, &trips).await?;
    tracing::info!(%trip_id, "deleted trip");

    let released = self
      .release_bookings(&removed, "trip deleted by driver")
      .await?;

    for booking in released {
      let message = format!(
        "The trip {} on {} was deleted by the driver. Your {} seat(s) were \
         released.",
        removed.route(),
        removed.departure_label(),
        booking.seat_count
      );
      self
        .notifier
        .dispatch(
          booking.passenger_id,
          NotificationKind::TripDeleted,
          "Trip deleted",
          message,
          trip_id,
        )
        .await?;
    }

    Ok(removed)
  }

  /// Mark a trip cancelled. It stays listed, under the cancelled tab.
  pub async fn cancel(&self, trip_id: Uuid, requester: Uuid) -> Result<Trip> {
    let now = local_now(&self.clock);
    let Snapshot { version, value: mut trips } = self.repo.trips().await?;
    let idx = find_trip(&trips, trip_id)?;
    authorize(&trips[idx], requester, now)?;
    if trips[idx].cancelled {
      return Err(Error::TripCancelled(trip_id));
    }

    // Legacy passenger entries stay until their bookings are released, so
    // none of them is lost if the release fails.
    let trip = &mut trips[idx];
    trip.cancelled = true;
    trip.updated_at = self.clock.utc();
    let cancelled = trip.clone();
    self.repo.save_trips(version, &trips).await?;
    tracing::info!(%trip_id, "cancelled trip");

    let released = self
      .release_bookings(&cancelled, "trip cancelled by driver")
      .await?;

    for booking in &released {
      let message = format!(
        "The trip {} on {} was cancelled by the driver.",
        cancelled.route(),
        cancelled.departure_label(),
      );
      self
        .notifier
        .dispatch(
          booking.passenger_id,
          NotificationKind::TripCancelled,
          "Trip cancelled",
          message,
          trip_id,
        )
        .await?;
    }

    // Re-read to return the rebuilt passenger list.
    self.get(trip_id).await
  }

  /// Cancel every active booking of `trip`, recording implicit ones as
  /// explicit cancelled records, then rebuild its passenger list. Returns the
  /// bookings as they were before.
  ///
  /// The trip change is already committed when this runs, so conflicting
  /// reservation writes are retried from a fresh read. If the bookings still
  /// cannot be written they are returned anyway: their passengers must be
  /// told, and a booking on a removed or cancelled trip is listed as
  /// cancelled regardless.
  async fn release_bookings(
    &self,
    trip: &Trip,
    reason: &str,
  ) -> Result<Vec<Reservation>> {
    let mut attempt = 1;
    loop {
      let Snapshot { version, value: mut records } =
        self.repo.reservations().await?;
      let active = bookings::active_bookings(trip, &records);
      if active.is_empty() {
        return Ok(active);
      }

      for booking in &active {
        let mut cancelled = booking.clone();
        cancelled.cancel(Some(reason.to_owned()));
        match records
          .iter_mut()
          .find(|r| r.reservation_id == booking.reservation_id)
        {
          Some(record) => *record = cancelled,
          None => records.push(cancelled),
        }
      }

      match self.repo.save_reservations(version, &records).await {
        Ok(_) => {
          sync_passengers(&self.repo, trip.trip_id, &records).await?;
          return Ok(active);
        }
        Err(Error::Conflict { .. }) if attempt < RELEASE_ATTEMPTS => {
          tracing::debug!(trip_id = %trip.trip_id, attempt, "retrying release");
          attempt += 1;
        }
        Err(err) => {
          tracing::error!(
            trip_id = %trip.trip_id,
            error = %err,
            "bookings left active on a withdrawn trip"
          );
          return Ok(active);
        }
      }
    }
  }
}
