//! Encoding and decoding helpers between store types and the plain values
//! held in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and versions as signed 64-bit
//! integers, SQLite's native integer type.

use chrono::{DateTime, Utc};
use ride_core::store::{StoredBlob, Version};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Version ─────────────────────────────────────────────────────────────────

pub fn encode_version(v: Version) -> Result<i64> {
  i64::try_from(v.get()).map_err(|_| Error::VersionOverflow(v.get()))
}

pub fn decode_version(raw: i64) -> Result<Version> {
  u64::try_from(raw)
    .map(Version::new)
    .map_err(|_| Error::InvalidVersion(raw))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `collections` row.
pub struct RawBlob {
  pub version:    i64,
  pub body:       String,
  pub updated_at: String,
}

impl RawBlob {
  pub fn into_blob(self) -> Result<StoredBlob> {
    Ok(StoredBlob {
      version:    decode_version(self.version)?,
      body:       self.body,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// What a commit attempt found, before version decoding.
pub enum RawCommit {
  Applied(i64),
  Stale(i64),
}
