//! Subcommands and their execution against a [`Marketplace`].

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use chrono::{NaiveDate, NaiveTime};
use clap::{Subcommand, ValueEnum};
use ride_core::{
  search::{SortKey, TripQuery},
  status::Tab,
  trip::{NewTrip, Trip, TripPatch},
  user::{Role, User},
};
use ride_service::Marketplace;
use ride_store_sqlite::SqliteStore;
use serde::Serialize;
use uuid::Uuid;

type Market = Marketplace<SqliteStore>;

fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
  NaiveTime::parse_from_str(s, "%H:%M")
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
  Driver,
  Passenger,
}

impl From<RoleArg> for Role {
  fn from(r: RoleArg) -> Self {
    match r {
      RoleArg::Driver => Role::Driver,
      RoleArg::Passenger => Role::Passenger,
    }
  }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortArg {
  PriceAsc,
  PriceDesc,
  TimeAsc,
  TimeDesc,
  Rating,
}

impl From<SortArg> for SortKey {
  fn from(s: SortArg) -> Self {
    match s {
      SortArg::PriceAsc => SortKey::PriceAsc,
      SortArg::PriceDesc => SortKey::PriceDesc,
      SortArg::TimeAsc => SortKey::TimeAsc,
      SortArg::TimeDesc => SortKey::TimeDesc,
      SortArg::Rating => SortKey::RatingDesc,
    }
  }
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Load users from a JSON array, skipping ids already present.
  Seed { file: PathBuf },
  /// Create a user.
  Register {
    name: String,
    #[arg(long, value_enum, default_value_t = RoleArg::Passenger)]
    role: RoleArg,
  },
  /// Sign in as an existing user.
  Login { user_id: Uuid },
  Logout,
  Whoami,

  /// Publish a trip as the signed-in driver.
  Publish {
    #[arg(long)]
    from:         String,
    #[arg(long)]
    to:           String,
    #[arg(long)]
    from_address: Option<String>,
    #[arg(long)]
    to_address:   Option<String>,
    #[arg(long)]
    date:         NaiveDate,
    #[arg(long, value_parser = parse_time)]
    time:         NaiveTime,
    #[arg(long)]
    seats:        u32,
    #[arg(long, default_value_t = 0.0)]
    price:        f64,
    #[arg(long)]
    vehicle:      Option<String>,
  },
  /// Every stored trip.
  Trips,
  /// The signed-in driver's trips with their tabs.
  MyTrips,
  /// Change fields of one of your trips.
  Edit {
    trip_id:      Uuid,
    #[arg(long)]
    from:         Option<String>,
    #[arg(long)]
    to:           Option<String>,
    #[arg(long)]
    from_address: Option<String>,
    #[arg(long)]
    to_address:   Option<String>,
    #[arg(long)]
    date:         Option<NaiveDate>,
    #[arg(long, value_parser = parse_time)]
    time:         Option<NaiveTime>,
    #[arg(long)]
    seats:        Option<u32>,
    #[arg(long)]
    price:        Option<f64>,
    #[arg(long)]
    vehicle:      Option<String>,
  },
  Delete { trip_id: Uuid },
  CancelTrip { trip_id: Uuid },

  Search {
    #[arg(long, default_value_t = 1)]
    seats:    u32,
    #[arg(long)]
    date:     Option<NaiveDate>,
    #[arg(long)]
    from:     Option<String>,
    #[arg(long)]
    to:       Option<String>,
    #[arg(long, value_enum)]
    sort:     Option<SortArg>,
    /// Hide cancelled and departed trips.
    #[arg(long)]
    bookable: bool,
  },

  /// Book seats on a trip as the signed-in passenger.
  Reserve {
    trip_id: Uuid,
    #[arg(long, default_value_t = 1)]
    seats:   u32,
  },
  /// Cancel one of your reservations.
  Cancel {
    reservation_id: Uuid,
    #[arg(long)]
    reason:         Option<String>,
  },
  /// Accept a pending reservation on one of your trips.
  Confirm { reservation_id: Uuid },
  MyReservations,

  Notifications,
  Read { notification_id: Uuid },
  Unread { notification_id: Uuid },
  ReadAll,
}

#[derive(Serialize)]
struct DriverTrip {
  #[serde(flatten)]
  trip: Trip,
  tab:  Tab,
}

#[derive(Serialize)]
struct Inbox<T> {
  unread:        usize,
  notifications: Vec<T>,
}

fn print_json(value: &impl Serialize) -> Result<()> {
  let out = serde_json::to_string_pretty(value).context("encoding output")?;
  println!("{out}");
  Ok(())
}

pub async fn run(market: &Market, command: Command) -> Result<()> {
  match command {
    Command::Seed { file } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading seed file {}", file.display()))?;
      let users: Vec<User> =
        serde_json::from_str(&raw).context("parsing seed file")?;
      let added = market.users.seed(users).await?;
      print_json(&serde_json::json!({ "added": added }))
    }
    Command::Register { name, role } => {
      print_json(&market.users.register(&name, role.into()).await?)
    }
    Command::Login { user_id } => print_json(&market.users.sign_in(user_id).await?),
    Command::Logout => {
      market.users.sign_out().await?;
      print_json(&serde_json::Value::Null)
    }
    Command::Whoami => print_json(&market.users.current().await?),

    Command::Publish {
      from,
      to,
      from_address,
      to_address,
      date,
      time,
      seats,
      price,
      vehicle,
    } => {
      let me = market.users.require_current().await?;
      let input = NewTrip {
        origin_address: from_address,
        destination_address: to_address,
        price,
        vehicle,
        ..NewTrip::new(me.user_id, from, to, date, time, seats)
      };
      print_json(&market.trips.publish(input).await?)
    }
    Command::Trips => print_json(&market.trips.all().await?),
    Command::MyTrips => {
      let me = market.users.require_current().await?;
      let mine: Vec<DriverTrip> = market
        .trips
        .driver_trips(me.user_id)
        .await?
        .into_iter()
        .map(|(trip, tab)| DriverTrip { trip, tab })
        .collect();
      print_json(&mine)
    }
    Command::Edit {
      trip_id,
      from,
      to,
      from_address,
      to_address,
      date,
      time,
      seats,
      price,
      vehicle,
    } => {
      let me = market.users.require_current().await?;
      let patch = TripPatch {
        origin: from,
        origin_address: from_address,
        destination: to,
        destination_address: to_address,
        date,
        time,
        seats,
        price,
        vehicle,
      };
      print_json(&market.trips.update(trip_id, me.user_id, patch).await?)
    }
    Command::Delete { trip_id } => {
      let me = market.users.require_current().await?;
      print_json(&market.trips.delete(trip_id, me.user_id).await?)
    }
    Command::CancelTrip { trip_id } => {
      let me = market.users.require_current().await?;
      print_json(&market.trips.cancel(trip_id, me.user_id).await?)
    }

    Command::Search { seats, date, from, to, sort, bookable } => {
      let query = TripQuery {
        seats,
        date,
        origin: from,
        destination: to,
        sort: sort.map(Into::into),
        bookable_only: bookable,
      };
      print_json(&market.search.search(&query).await?)
    }

    Command::Reserve { trip_id, seats } => {
      let me = market.users.require_current().await?;
      print_json(&market.reservations.reserve(trip_id, me.user_id, seats).await?)
    }
    Command::Cancel { reservation_id, reason } => {
      let me = market.users.require_current().await?;
      let mine = market.reservations.for_passenger(me.user_id).await?;
      if !mine.iter().any(|l| l.reservation.reservation_id == reservation_id) {
        bail!("reservation {reservation_id} is not one of yours");
      }
      print_json(&market.reservations.cancel(reservation_id, reason).await?)
    }
    Command::Confirm { reservation_id } => {
      let me = market.users.require_current().await?;
      print_json(&market.reservations.confirm(reservation_id, me.user_id).await?)
    }
    Command::MyReservations => {
      let me = market.users.require_current().await?;
      print_json(&market.reservations.for_passenger(me.user_id).await?)
    }

    Command::Notifications => {
      let me = market.users.require_current().await?;
      let inbox = Inbox {
        unread:        market.notifications.unread_count(me.user_id).await?,
        notifications: market.notifications.for_user(me.user_id).await?,
      };
      print_json(&inbox)
    }
    Command::Read { notification_id } => {
      let me = market.users.require_current().await?;
      print_json(&market.notifications.mark_read(me.user_id, notification_id).await?)
    }
    Command::Unread { notification_id } => {
      let me = market.users.require_current().await?;
      print_json(
        &market.notifications.mark_unread(me.user_id, notification_id).await?,
      )
    }
    Command::ReadAll => {
      let me = market.users.require_current().await?;
      let changed = market.notifications.mark_all_read(me.user_id).await?;
      print_json(&serde_json::json!({ "marked_read": changed }))
    }
  }
}
