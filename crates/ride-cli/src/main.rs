//! `ride` — operator CLI for the ride marketplace store.
//!
//! Reads `ride.toml` (or the path given with `--config`) and `RIDE_*`
//! environment variables, opens the SQLite store, runs one command against it
//! and prints the result as JSON.
//!
//! # Usage
//!
//! ```
//! ride register "Dana" --role driver
//! ride login 5f0c...
//! ride publish --from Campus --to Station --date 2025-01-10 --time 08:00 --seats 3
//! ride search --seats 2 --sort price-asc
//! ```

mod commands;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use commands::Command;
use mockable::DefaultClock;
use ride_service::Marketplace;
use ride_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ride", version, about = "Trips, reservations and notifications")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "ride.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Settings {
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("ride.db") }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Diagnostics go to stderr; stdout carries the JSON output.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings: Settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("RIDE"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let store_path = expand_tilde(&settings.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let market = Marketplace::new(Arc::new(store), Arc::new(DefaultClock));
  commands::run(&market, cli.command).await
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/ride.db")),
      PathBuf::from(home).join("ride.db")
    );
    assert_eq!(expand_tilde(Path::new("/tmp/ride.db")), PathBuf::from("/tmp/ride.db"));
  }

  #[test]
  fn cli_parses_publish() {
    let cli = Cli::try_parse_from([
      "ride", "publish", "--from", "Campus", "--to", "Station", "--date",
      "2025-01-10", "--time", "08:00", "--seats", "3",
    ])
    .unwrap();
    assert_eq!(cli.config, PathBuf::from("ride.toml"));
    assert!(matches!(cli.command, Command::Publish { seats: 3, .. }));
  }
}
