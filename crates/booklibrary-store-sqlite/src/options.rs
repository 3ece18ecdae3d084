//! Connection options for [`SqliteStore`](crate::SqliteStore).

use std::{path::PathBuf, time::Duration};

use crate::{Error, Result};

/// Per-call budget applied to every store operation.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(2);
/// Budget for opening, bootstrapping and pinging the database.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// Database file, or `:memory:`.
  pub path:            PathBuf,
  /// Collection (table) holding the book documents.
  pub collection:      String,
  pub call_timeout:    Duration,
  pub startup_timeout: Duration,
}

impl StoreOptions {
  pub fn new(path: impl Into<PathBuf>, collection: impl Into<String>) -> Self {
    Self {
      path:            path.into(),
      collection:      collection.into(),
      call_timeout:    DEFAULT_CALL_TIMEOUT,
      startup_timeout: DEFAULT_STARTUP_TIMEOUT,
    }
  }

  pub fn in_memory(collection: impl Into<String>) -> Self {
    Self::new(IN_MEMORY, collection)
  }

  pub fn call_timeout(mut self, timeout: Duration) -> Self {
    self.call_timeout = timeout;
    self
  }

  pub fn startup_timeout(mut self, timeout: Duration) -> Self {
    self.startup_timeout = timeout;
    self
  }

  /// Reject options that cannot produce a working store.
  ///
  /// The collection name is interpolated into SQL, so it must be a plain
  /// identifier.
  pub fn validate(&self) -> Result<()> {
    if self.path.as_os_str().is_empty() {
      return Err(Error::InvalidOptions("database path is empty".into()));
    }
    if !is_identifier(&self.collection) {
      return Err(Error::InvalidOptions(format!(
        "collection name {:?} must match [A-Za-z_][A-Za-z0-9_]*",
        self.collection
      )));
    }
    if self.collection.to_ascii_lowercase().starts_with("sqlite_") {
      return Err(Error::InvalidOptions(format!(
        "collection name {:?} is reserved",
        self.collection
      )));
    }
    if self.call_timeout.is_zero() || self.startup_timeout.is_zero() {
      return Err(Error::InvalidOptions("timeouts must be non-zero".into()));
    }
    Ok(())
  }
}

fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
