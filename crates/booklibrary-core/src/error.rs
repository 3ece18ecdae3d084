//! The storage-agnostic error vocabulary.
//!
//! Backends keep their own error types but classify every error into an
//! [`ErrorKind`] through [`StoreError`]. Only the transport layer turns kinds
//! into status codes.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// The identifier is not in the form the store expects.
  InvalidId,
  /// A well-formed identifier matches no record.
  NotFound,
  /// The backing store could not be reached or did not answer in time.
  StorageUnavailable,
  /// The inbound request body or content type was rejected.
  BadRequest,
  Internal,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::InvalidId => "invalid_id",
      Self::NotFound => "not_found",
      Self::StorageUnavailable => "storage_unavailable",
      Self::BadRequest => "bad_request",
      Self::Internal => "internal",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Implemented by every [`CatalogStore`](crate::store::CatalogStore) error
/// type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}
