//! Tab classification for trips and reservations.
//!
//! Status is never stored. It is derived from the trip's scheduled instant,
//! its cancelled flag, and the caller's notion of `now`, every time it is
//! read. Every view classifies through these two functions so that search
//! results, my-trips and my-reservations cannot disagree.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{reservation::Reservation, trip::Trip};

/// The mutually exclusive tabs a trip or reservation is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
  Upcoming,
  History,
  Cancelled,
}

/// Classify a trip as seen at `now`.
pub fn trip_status(trip: &Trip, now: NaiveDateTime) -> Tab {
  if trip.cancelled {
    Tab::Cancelled
  } else if trip.scheduled_at() > now {
    Tab::Upcoming
  } else {
    Tab::History
  }
}

/// Classify a reservation by its own status and its trip's schedule.
///
/// A reservation whose trip was cancelled or no longer exists is listed as
/// cancelled alongside the ones the passenger cancelled.
pub fn reservation_status(
  reservation: &Reservation,
  trip: Option<&Trip>,
  now: NaiveDateTime,
) -> Tab {
  match trip {
    _ if !reservation.is_active() => Tab::Cancelled,
    None => Tab::Cancelled,
    Some(trip) => trip_status(trip, now),
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::trip::tests::{at, trip};

  #[test]
  fn future_trip_is_upcoming_and_past_trip_is_history() {
    let t = trip("2025-01-10", "08:00", 2);
    assert_eq!(trip_status(&t, at("2025-01-10", "07:59")), Tab::Upcoming);
    assert_eq!(trip_status(&t, at("2025-01-10", "08:00")), Tab::History);
    assert_eq!(trip_status(&t, at("2025-02-01", "00:00")), Tab::History);
  }

  #[test]
  fn cancelled_flag_wins_over_schedule() {
    let mut t = trip("2025-01-10", "08:00", 2);
    t.cancelled = true;
    assert_eq!(trip_status(&t, at("2025-01-01", "00:00")), Tab::Cancelled);
    assert_eq!(trip_status(&t, at("2025-03-01", "00:00")), Tab::Cancelled);
  }

  #[test]
  fn classification_is_repeatable() {
    let t = trip("2025-01-10", "08:00", 2);
    let now = at("2025-01-09", "12:00");
    assert_eq!(trip_status(&t, now), trip_status(&t, now));
  }

  #[test]
  fn reservation_follows_trip_schedule_not_creation_time() {
    let t = trip("2025-01-10", "08:00", 2);
    let r = Reservation::pending(&t, Uuid::new_v4(), 1, Utc::now());
    assert_eq!(
      reservation_status(&r, Some(&t), at("2025-01-09", "00:00")),
      Tab::Upcoming
    );
    assert_eq!(
      reservation_status(&r, Some(&t), at("2025-01-11", "00:00")),
      Tab::History
    );
  }

  #[test]
  fn cancelled_or_orphaned_reservation_is_cancelled() {
    let t = trip("2025-01-10", "08:00", 2);
    let mut r = Reservation::pending(&t, Uuid::new_v4(), 1, Utc::now());
    let now = at("2025-01-09", "00:00");
    assert_eq!(reservation_status(&r, None, now), Tab::Cancelled);

    r.cancel(Some("schedule conflict".into()));
    assert_eq!(reservation_status(&r, Some(&t), now), Tab::Cancelled);
  }
}
