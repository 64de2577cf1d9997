//! Core types and trait definitions for the ride marketplace.
//!
//! This crate is deliberately free of database and runtime dependencies. It
//! holds the entity model, the pure rules that derive state from it (tab
//! classification, seat accounting, search), and the [`store::CollectionStore`]
//! contract that persistence backends implement.

pub mod bookings;
pub mod error;
pub mod notification;
pub mod reservation;
pub mod search;
pub mod status;
pub mod store;
pub mod trip;
pub mod user;

pub use error::{Error, Result};
