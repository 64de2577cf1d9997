//! Trips — scheduled, capacity-bounded rides offered by a driver.
//!
//! A trip's `date` and `time` are local wall-clock values; combined they form
//! the scheduled instant that drives every status decision. Once that instant
//! has passed, the trip is frozen.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Display format for scheduled instants in passenger-facing text.
pub const SCHEDULE_FORMAT: &str = "%Y-%m-%d %H:%M";

// ─── Trip ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
  pub trip_id:             Uuid,
  pub driver_id:           Uuid,
  /// Authoritative for authorization; equal to `driver_id` in practice.
  pub creator_id:          Uuid,
  pub origin:              String,
  pub origin_address:      Option<String>,
  pub destination:         String,
  pub destination_address: Option<String>,
  pub date:                NaiveDate,
  pub time:                NaiveTime,
  pub seats:               u32,
  /// Price per seat.
  pub price:               f64,
  pub vehicle:             Option<String>,
  /// Legacy passenger list. Rebuilt from active bookings on every booking
  /// write; see [`crate::bookings`].
  #[serde(default)]
  pub passengers:          Vec<Uuid>,
  #[serde(default)]
  pub cancelled:           bool,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl Trip {
  /// The scheduled departure instant.
  pub fn scheduled_at(&self) -> NaiveDateTime { self.date.and_time(self.time) }

  /// The scheduled instant as shown to passengers.
  pub fn departure_label(&self) -> String {
    self.scheduled_at().format(SCHEDULE_FORMAT).to_string()
  }

  pub fn has_started(&self, now: NaiveDateTime) -> bool {
    self.scheduled_at() <= now
  }

  /// Whether `user_id` is allowed to edit, delete, or cancel this trip.
  pub fn is_managed_by(&self, user_id: Uuid) -> bool {
    self.creator_id == user_id || self.driver_id == user_id
  }

  /// Short human-readable route, e.g. `"Campus to Downtown"`.
  pub fn route(&self) -> String {
    format!("{} to {}", self.origin, self.destination)
  }

  /// Check the fields that must hold for any stored trip, regardless of time.
  pub fn validate_fields(&self) -> Result<()> {
    validate_fields(&self.origin, &self.destination, self.seats, self.price)
  }
}

fn validate_fields(
  origin: &str,
  destination: &str,
  seats: u32,
  price: f64,
) -> Result<()> {
  if origin.trim().is_empty() {
    return Err(Error::MissingField("origin"));
  }
  if destination.trim().is_empty() {
    return Err(Error::MissingField("destination"));
  }
  if seats == 0 {
    return Err(Error::NoSeats);
  }
  if !price.is_finite() || price < 0.0 {
    return Err(Error::InvalidPrice);
  }
  Ok(())
}

/// Reject a schedule that lies before `now`: a date before today, or today
/// with a time already gone.
pub fn ensure_departure_ahead(
  date: NaiveDate,
  time: NaiveTime,
  now: NaiveDateTime,
) -> Result<()> {
  let at = date.and_time(time);
  if at < now {
    return Err(Error::DepartureInPast(at));
  }
  Ok(())
}

// ─── NewTrip ─────────────────────────────────────────────────────────────────

/// Input to the publish operation. Identity, timestamps, passengers and the
/// cancelled flag are always assigned by the layer.
#[derive(Debug, Clone)]
pub struct NewTrip {
  pub driver_id:           Uuid,
  pub origin:              String,
  pub origin_address:      Option<String>,
  pub destination:         String,
  pub destination_address: Option<String>,
  pub date:                NaiveDate,
  pub time:                NaiveTime,
  pub seats:               u32,
  pub price:               f64,
  pub vehicle:             Option<String>,
}

impl NewTrip {
  /// Convenience constructor with a free ride and no optional details.
  pub fn new(
    driver_id: Uuid,
    origin: impl Into<String>,
    destination: impl Into<String>,
    date: NaiveDate,
    time: NaiveTime,
    seats: u32,
  ) -> Self {
    Self {
      driver_id,
      origin: origin.into(),
      origin_address: None,
      destination: destination.into(),
      destination_address: None,
      date,
      time,
      seats,
      price: 0.0,
      vehicle: None,
    }
  }

  pub fn validate(&self, now: NaiveDateTime) -> Result<()> {
    validate_fields(&self.origin, &self.destination, self.seats, self.price)?;
    ensure_departure_ahead(self.date, self.time, now)
  }

  /// Build the stored trip. The publishing driver is also its creator.
  pub fn into_trip(self, trip_id: Uuid, recorded_at: DateTime<Utc>) -> Trip {
    Trip {
      trip_id,
      driver_id: self.driver_id,
      creator_id: self.driver_id,
      origin: self.origin.trim().to_owned(),
      origin_address: self.origin_address,
      destination: self.destination.trim().to_owned(),
      destination_address: self.destination_address,
      date: self.date,
      time: self.time,
      seats: self.seats,
      price: self.price,
      vehicle: self.vehicle,
      passengers: Vec::new(),
      cancelled: false,
      created_at: recorded_at,
      updated_at: recorded_at,
    }
  }
}

// ─── Edits ───────────────────────────────────────────────────────────────────

/// A requested edit. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct TripPatch {
  pub origin:              Option<String>,
  pub origin_address:      Option<String>,
  pub destination:         Option<String>,
  pub destination_address: Option<String>,
  pub date:                Option<NaiveDate>,
  pub time:                Option<NaiveTime>,
  pub seats:               Option<u32>,
  pub price:               Option<f64>,
  pub vehicle:             Option<String>,
}

/// One field that an edit actually changed.
#[derive(Debug, Clone, PartialEq)]
pub enum TripChange {
  Origin { from: String, to: String },
  Destination { from: String, to: String },
  /// Date and time are reported together as one departure change.
  Schedule { from: NaiveDateTime, to: NaiveDateTime },
  OriginAddress,
  DestinationAddress,
  Seats { from: u32, to: u32 },
  Price { from: f64, to: f64 },
  Vehicle,
}

impl TripChange {
  /// Passenger-facing text for the changes passengers are told about.
  /// Returns `None` for changes that do not warrant a notification.
  pub fn describe(&self) -> Option<String> {
    match self {
      Self::Origin { from, to } => {
        Some(format!("origin changed from {from} to {to}"))
      }
      Self::Destination { from, to } => {
        Some(format!("destination changed from {from} to {to}"))
      }
      Self::Schedule { from, to } => Some(format!(
        "departure moved from {} to {}",
        from.format(SCHEDULE_FORMAT),
        to.format(SCHEDULE_FORMAT)
      )),
      Self::OriginAddress
      | Self::DestinationAddress
      | Self::Seats { .. }
      | Self::Price { .. }
      | Self::Vehicle => None,
    }
  }
}

/// The requested value of an optional detail field: `None` leaves it alone,
/// a blank string clears it.
fn detail(requested: &Option<String>) -> Option<Option<String>> {
  requested.as_deref().map(|value| {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
  })
}

impl TripPatch {
  /// The fields whose requested value differs from `trip`. Empty when the
  /// edit would be a no-op.
  pub fn changes(&self, trip: &Trip) -> Vec<TripChange> {
    let mut changes = Vec::new();

    if let Some(origin) = self.origin.as_deref().map(str::trim)
      && origin != trip.origin
    {
      changes.push(TripChange::Origin {
        from: trip.origin.clone(),
        to:   origin.to_owned(),
      });
    }
    if let Some(destination) = self.destination.as_deref().map(str::trim)
      && destination != trip.destination
    {
      changes.push(TripChange::Destination {
        from: trip.destination.clone(),
        to:   destination.to_owned(),
      });
    }

    let from = trip.scheduled_at();
    let to = self
      .date
      .unwrap_or(trip.date)
      .and_time(self.time.unwrap_or(trip.time));
    if from != to {
      changes.push(TripChange::Schedule { from, to });
    }

    if let Some(address) = detail(&self.origin_address)
      && address != trip.origin_address
    {
      changes.push(TripChange::OriginAddress);
    }
    if let Some(address) = detail(&self.destination_address)
      && address != trip.destination_address
    {
      changes.push(TripChange::DestinationAddress);
    }
    if let Some(seats) = self.seats
      && seats != trip.seats
    {
      changes.push(TripChange::Seats { from: trip.seats, to: seats });
    }
    if let Some(price) = self.price
      && price != trip.price
    {
      changes.push(TripChange::Price { from: trip.price, to: price });
    }
    if let Some(vehicle) = detail(&self.vehicle)
      && vehicle != trip.vehicle
    {
      changes.push(TripChange::Vehicle);
    }

    changes
  }

  /// Merge the requested values into `trip`. Timestamps are left alone.
  pub fn apply(&self, trip: &mut Trip) {
    if let Some(origin) = &self.origin {
      trip.origin = origin.trim().to_owned();
    }
    if let Some(destination) = &self.destination {
      trip.destination = destination.trim().to_owned();
    }
    if let Some(address) = detail(&self.origin_address) {
      trip.origin_address = address;
    }
    if let Some(address) = detail(&self.destination_address) {
      trip.destination_address = address;
    }
    if let Some(date) = self.date {
      trip.date = date;
    }
    if let Some(time) = self.time {
      trip.time = time;
    }
    if let Some(seats) = self.seats {
      trip.seats = seats;
    }
    if let Some(price) = self.price {
      trip.price = price;
    }
    if let Some(vehicle) = detail(&self.vehicle) {
      trip.vehicle = vehicle;
    }
  }
}
