//! SQL schema for the ride SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per logical collection. `body` is the whole encoded collection and
-- is only ever replaced wholesale; `version` increases by one per commit.
CREATE TABLE IF NOT EXISTS collections (
    name        TEXT PRIMARY KEY,   -- e.g. 'trips', 'notifications:<uuid>'
    version     INTEGER NOT NULL CHECK (version > 0),
    body        TEXT NOT NULL,
    updated_at  TEXT NOT NULL       -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";
