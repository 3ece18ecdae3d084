//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use booklibrary_core::{ErrorKind, StoreError};
use thiserror::Error;

/// The one place an [`ErrorKind`] becomes a status code.
///
/// `InvalidId` and `NotFound` both answer 404, so a malformed id looks the
/// same to clients as an unknown one.
pub const fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::InvalidId | ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
    ErrorKind::StorageUnavailable | ErrorKind::Internal => {
      StatusCode::INTERNAL_SERVER_ERROR
    }
  }
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error ({kind}): {source}")]
  Store {
    kind:   ErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn store<E: StoreError>(e: E) -> Self {
    ApiError::Store { kind: e.kind(), source: Box::new(e) }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      ApiError::BadRequest(_) => ErrorKind::BadRequest,
      ApiError::Store { kind, .. } => *kind,
      ApiError::Internal(_) => ErrorKind::Internal,
    }
  }

  pub fn status(&self) -> StatusCode { status_for(self.kind()) }
}

/// The body is only the status reason; the error text goes to the log.
impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, kind = %self.kind(), "request failed");
    } else {
      tracing::info!(error = %self, kind = %self.kind(), "request rejected");
    }
    (status, status.canonical_reason().unwrap_or_default()).into_response()
  }
}
