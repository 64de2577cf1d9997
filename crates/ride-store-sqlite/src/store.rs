//! [`SqliteStore`] — the SQLite implementation of [`CollectionStore`].

use std::path::Path;

use chrono::Utc;
use ride_core::store::{
  CollectionKey, CollectionStore, Commit, StoredBlob, Version,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{RawBlob, RawCommit, decode_version, encode_dt, encode_version},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ride collection store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Names of every collection written so far, sorted.
  pub async fn collection_names(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT name FROM collections ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }
}

// ─── CollectionStore impl ────────────────────────────────────────────────────

impl CollectionStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self, key: CollectionKey) -> Result<Option<StoredBlob>> {
    let name = key.to_string();

    let raw: Option<RawBlob> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT version, body, updated_at FROM collections WHERE name = ?1",
              rusqlite::params![name],
              |row| {
                Ok(RawBlob {
                  version:    row.get(0)?,
                  body:       row.get(1)?,
                  updated_at: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBlob::into_blob).transpose()
  }

  async fn commit(
    &self,
    key: CollectionKey,
    expected: Version,
    body: String,
  ) -> Result<Commit> {
    let name = key.to_string();
    let expected_raw = encode_version(expected)?;
    let at_str = encode_dt(Utc::now());

    // Compare and swap inside one transaction; dropping `tx` on the stale
    // path rolls it back.
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: i64 = tx
          .query_row(
            "SELECT version FROM collections WHERE name = ?1",
            rusqlite::params![name],
            |r| r.get(0),
          )
          .optional()?
          .unwrap_or(0);

        if current != expected_raw {
          return Ok(RawCommit::Stale(current));
        }

        let next = current + 1;
        tx.execute(
          "INSERT INTO collections (name, version, body, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (name) DO UPDATE SET
             version    = excluded.version,
             body       = excluded.body,
             updated_at = excluded.updated_at",
          rusqlite::params![name, next, body, at_str],
        )?;
        tx.commit()?;

        Ok(RawCommit::Applied(next))
      })
      .await?;

    Ok(match raw {
      RawCommit::Applied(v) => Commit::Applied(decode_version(v)?),
      RawCommit::Stale(v) => Commit::Stale { current: decode_version(v)? },
    })
  }
}
