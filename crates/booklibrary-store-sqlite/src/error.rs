//! Error type for `booklibrary-store-sqlite`.

use std::time::Duration;

use booklibrary_core::{ErrorKind, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("string is not a valid book id: {0:?}")]
  InvalidId(String),

  #[error("book not found: {0}")]
  NotFound(String),

  #[error("invalid store options: {0}")]
  InvalidOptions(String),

  #[error("database call exceeded its {0:?} deadline")]
  Timeout(Duration),

  #[error("database call abandoned by its caller")]
  Cancelled,

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidId(_) => ErrorKind::InvalidId,
      Error::NotFound(_) => ErrorKind::NotFound,
      Error::Timeout(_) | Error::Cancelled | Error::Database(_) | Error::Sqlite(_) => {
        ErrorKind::StorageUnavailable
      }
      Error::InvalidOptions(_) | Error::Json(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
