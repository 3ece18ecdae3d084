//! JSON REST API for the book library.
//!
//! Exposes axum routers backed by any [`booklibrary_core::CatalogStore`].
//! Listening, TLS and process lifecycle are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let state = AppState::new(store).with_metrics(Metrics::new()?);
//! let app = booklibrary_api::service(state);
//! axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
//! ```

pub mod books;
pub mod error;
pub mod health;
pub mod json;
pub mod metrics;

use std::{sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use booklibrary_core::{CatalogStore, Context};
use tower::Layer as _;
use tower_http::{
  normalize_path::{NormalizePath, NormalizePathLayer},
  trace::TraceLayer,
};

pub use error::{ApiError, status_for};
pub use metrics::Metrics;

/// Where [`router`] mounts the book resource.
pub const BOOKS_PATH: &str = "/api/books";
pub const READY_PATH: &str = "/healthz/ready";
pub const LIVE_PATH: &str = "/healthz/live";
pub const METRICS_PATH: &str = "/metrics";

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:           Arc<S>,
  /// Deadline given to each request's store call, on top of the store's own
  /// per-call budget.
  pub request_timeout: Option<Duration>,
  /// When set, the book routes are instrumented and `/metrics` is served.
  pub metrics:         Option<Metrics>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, request_timeout: None, metrics: None }
  }

  pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = Some(timeout);
    self
  }

  pub fn with_metrics(mut self, metrics: Metrics) -> Self {
    self.metrics = Some(metrics);
    self
  }

  /// The context handed to the store for one request.
  pub fn context(&self) -> Context {
    match self.request_timeout {
      Some(t) => Context::with_timeout(t),
      None => Context::background(),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      request_timeout: self.request_timeout,
      metrics:         self.metrics.clone(),
    }
  }
}

// ─── Routers ──────────────────────────────────────────────────────────────────

/// The five book routes under `prefix` (`""` mounts them at the root).
pub fn book_routes<S>(prefix: &str) -> Router<AppState<S>>
where
  S: CatalogStore + 'static,
{
  let collection = if prefix.is_empty() { "/" } else { prefix };
  Router::new()
    .route(collection, get(books::list::<S>).post(books::create::<S>))
    .route(
      &format!("{prefix}/{{id}}"),
      get(books::get_one::<S>)
        .put(books::update::<S>)
        .delete(books::delete::<S>),
    )
}

/// A standalone book resource mounted at `prefix`.
pub fn resource_router<S>(state: AppState<S>, prefix: &str) -> Router<()>
where
  S: CatalogStore + 'static,
{
  book_routes::<S>(prefix).with_state(state)
}

/// Book resource at [`BOOKS_PATH`], the health probes and, when the state
/// carries [`Metrics`], the instrumented routes plus [`METRICS_PATH`].
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: CatalogStore + 'static,
{
  let instruments = state.metrics.clone();
  let mut books = book_routes::<S>(BOOKS_PATH);
  if let Some(m) = &instruments {
    books = books.route_layer(middleware::from_fn_with_state(m.clone(), metrics::track));
  }

  let mut app = books
    .route(READY_PATH, get(health::ready::<S>))
    .route(LIVE_PATH, get(health::live))
    .with_state(state);
  if let Some(m) = instruments {
    app = app.merge(Router::new().route(METRICS_PATH, get(metrics::export)).with_state(m));
  }
  app.layer(TraceLayer::new_for_http())
}

/// [`router`] behind trailing-slash stripping, so `/api/books/` and
/// `/api/books` reach the same handler.
pub fn service<S>(state: AppState<S>) -> NormalizePath<Router<()>>
where
  S: CatalogStore + 'static,
{
  NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

#[cfg(test)]
mod tests;
