//! Error type for `ride-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored version column held a value outside the version range.
  #[error("invalid stored version: {0}")]
  InvalidVersion(i64),

  #[error("version {0} does not fit the version column")]
  VersionOverflow(u64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
