//! Liveness and readiness probes.

use std::time::Duration;

use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use booklibrary_core::{CatalogStore, Context};

/// Deadline for a readiness check, independent of any request deadline.
pub const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// `GET /healthz/ready`: 200 when the store answers a ping, 503 otherwise.
pub async fn ready<S>(State(state): State<crate::AppState<S>>) -> Response
where
  S: CatalogStore + 'static,
{
  let ctx = Context::with_timeout(READY_TIMEOUT);
  let outcome = tokio::time::timeout(READY_TIMEOUT, state.store.ping(ctx)).await;
  match outcome {
    Ok(Ok(())) => (StatusCode::OK, "OK\n").into_response(),
    Ok(Err(e)) => {
      tracing::error!(error = %e, "ping database");
      StatusCode::SERVICE_UNAVAILABLE.into_response()
    }
    Err(_) => {
      tracing::error!(timeout = ?READY_TIMEOUT, "ping database timed out");
      StatusCode::SERVICE_UNAVAILABLE.into_response()
    }
  }
}

/// `GET /healthz/live`: the process is up; the store is not consulted.
pub async fn live() -> &'static str { "OK\n" }
