//! rollcall-server binary.
//!
//! Reads `rollcall.toml` (or the path specified with `--config`) layered with
//! `ROLLCALL_*` environment variables, opens an in-process SQLite store, and
//! serves the JSON API over HTTP.
//!
//! # PIN hash generation
//!
//! To generate the argon2 PHC string for `bootstrap.pin_hash`:
//!
//! ```
//! cargo run -p rollcall-server -- --hash-pin
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use rollcall_api::{
  AppState,
  auth::{hash_pin, validate_pin},
};
use rollcall_server::{ServerConfig, bootstrap_admin};
use rollcall_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rollcall attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "rollcall.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a PIN entered on stdin and exit.
  #[arg(long)]
  hash_pin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a PIN and exit.
  if cli.hash_pin {
    let pin = read_pin()?;
    validate_pin(&pin).map_err(|e| anyhow::anyhow!("{e}"))?;
    let hash = hash_pin(&pin).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "~/.local/share/rollcall/rollcall.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("ROLLCALL")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  bootstrap_admin(&store, server_cfg.bootstrap.as_ref())
    .await
    .context("failed to create bootstrap admin")?;

  tracing::info!(
    streak_rule = ?server_cfg.analytics.streak_rule,
    locked = server_cfg.attendance_locked,
    "starting"
  );
  let state = AppState::new(
    Arc::new(store),
    server_cfg.attendance_locked,
    server_cfg.analytics.clone(),
  );

  let app = rollcall_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a PIN from stdin.
fn read_pin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("PIN: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim().to_owned())
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
