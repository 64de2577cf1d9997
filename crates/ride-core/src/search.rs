//! Trip search: filtering and ordering over an in-memory snapshot.
//!
//! The functions here are pure. Callers load trips, reservations and users
//! from the repository and hand them over together with `now`.

use std::{cmp::Ordering, collections::HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  bookings::available_seats,
  reservation::Reservation,
  status::{Tab, trip_status},
  trip::Trip,
  user::User,
};

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
  PriceAsc,
  PriceDesc,
  TimeAsc,
  TimeDesc,
  /// Highest driver rating first; drivers missing from the directory rate 0.
  RatingDesc,
}

/// Parameters for [`search`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripQuery {
  /// Seats the searcher needs; trips with fewer available are excluded.
  pub seats:         u32,
  /// Exact departure day.
  pub date:          Option<NaiveDate>,
  /// Case-insensitive substring of the origin label.
  pub origin:        Option<String>,
  /// Case-insensitive substring of the destination label.
  pub destination:   Option<String>,
  pub sort:          Option<SortKey>,
  /// Also drop cancelled trips and trips that have already departed.
  #[serde(default)]
  pub bookable_only: bool,
}

impl Default for TripQuery {
  fn default() -> Self {
    Self {
      seats:         1,
      date:          None,
      origin:        None,
      destination:   None,
      sort:          None,
      bookable_only: false,
    }
  }
}

/// A trip as presented in search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripListing {
  pub trip:            Trip,
  pub available_seats: u32,
  pub driver_rating:   f32,
  pub status:          Tab,
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
  match needle.map(str::trim) {
    None | Some("") => true,
    Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
  }
}

/// Filter `trips` by `query` and order the survivors.
pub fn search(
  trips: Vec<Trip>,
  reservations: &[Reservation],
  users: &[User],
  query: &TripQuery,
  now: NaiveDateTime,
) -> Vec<TripListing> {
  let ratings: HashMap<Uuid, f32> =
    users.iter().map(|u| (u.user_id, u.rating)).collect();

  let mut listings: Vec<TripListing> = trips
    .into_iter()
    .filter(|t| query.date.is_none_or(|d| t.date == d))
    .filter(|t| contains_ignore_case(&t.origin, query.origin.as_deref()))
    .filter(|t| {
      contains_ignore_case(&t.destination, query.destination.as_deref())
    })
    .map(|trip| TripListing {
      available_seats: available_seats(&trip, reservations),
      driver_rating: ratings.get(&trip.driver_id).copied().unwrap_or(0.0),
      status: trip_status(&trip, now),
      trip,
    })
    .filter(|l| l.available_seats >= query.seats)
    .filter(|l| !query.bookable_only || l.status == Tab::Upcoming)
    .collect();

  if let Some(key) = query.sort {
    listings.sort_by(|a, b| compare(key, a, b));
  }
  listings
}

fn compare(key: SortKey, a: &TripListing, b: &TripListing) -> Ordering {
  match key {
    SortKey::PriceAsc => a.trip.price.total_cmp(&b.trip.price),
    SortKey::PriceDesc => b.trip.price.total_cmp(&a.trip.price),
    SortKey::TimeAsc => a.trip.time.cmp(&b.trip.time),
    SortKey::TimeDesc => b.trip.time.cmp(&a.trip.time),
    SortKey::RatingDesc => b.driver_rating.total_cmp(&a.driver_rating),
  }
}
