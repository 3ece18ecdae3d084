//! Layered runtime settings: built-in defaults, then the TOML file, then
//! `BOOKLIBRARY_*` environment variables, then command-line flags.

use std::{path::PathBuf, time::Duration};

use booklibrary_store_sqlite::StoreOptions;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::Cli;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub collection:         String,
  pub debug:              bool,
  pub call_timeout_ms:    u64,
  pub startup_timeout_ms: u64,
  /// `0` disables the per-request deadline.
  pub request_timeout_ms: u64,
  /// How long in-flight requests may drain after a shutdown signal.
  pub shutdown_timeout_ms: u64,
}

impl Settings {
  pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
    Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 8000)?
      .set_default("store_path", "booklibrary.db")?
      .set_default("collection", "books")?
      .set_default("debug", false)?
      .set_default("call_timeout_ms", 2000)?
      .set_default("startup_timeout_ms", 10_000)?
      .set_default("request_timeout_ms", 10_000)?
      .set_default("shutdown_timeout_ms", 30_000)?
      .add_source(File::from(cli.config.as_path()).required(false))
      .add_source(Environment::with_prefix("BOOKLIBRARY").try_parsing(true))
      .set_override_option("port", cli.port)?
      .set_override_option(
        "store_path",
        cli
          .store_path
          .as_ref()
          .map(|p| p.to_string_lossy().into_owned()),
      )?
      .set_override_option("collection", cli.collection.clone())?
      .set_override_option("debug", cli.debug.then_some(true))?
      .build()?
      .try_deserialize()
  }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions::new(self.store_path.clone(), self.collection.clone())
      .call_timeout(Duration::from_millis(self.call_timeout_ms))
      .startup_timeout(Duration::from_millis(self.startup_timeout_ms))
  }

  pub fn request_timeout(&self) -> Option<Duration> {
    (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
  }

  pub fn shutdown_timeout(&self) -> Duration { Duration::from_millis(self.shutdown_timeout_ms) }
}
