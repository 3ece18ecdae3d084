//! Handlers for the book resource.
//!
//! | Method   | Path    | Notes |
//! |----------|---------|-------|
//! | `GET`    | `/`     | Optional `?limit=<n>`; falls back to 100 |
//! | `POST`   | `/`     | Body: [`Book`] without `_id`; returns 201 + `Location` |
//! | `GET`    | `/{id}` | 404 for unknown or malformed ids |
//! | `PUT`    | `/{id}` | Full replace; body `_id` is ignored |
//! | `DELETE` | `/{id}` | 204, empty body |
//!
//! Paths are relative to wherever the resource is mounted.

use std::num::NonZeroUsize;

use axum::{
  extract::{OriginalUri, Path, Query, State},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use booklibrary_core::{Book, CatalogStore, DEFAULT_LIMIT};

use crate::{
  AppState,
  error::ApiError,
  json::{StrictJson, respond, respond_with},
};

/// Log the outcome of a handler and turn it into a response.
fn finish(method: &'static str, result: Result<Response, ApiError>) -> Response {
  let response = result.unwrap_or_else(IntoResponse::into_response);
  tracing::debug!(
    status = response.status().as_u16(),
    resource = "Book",
    method,
    "handler complete"
  );
  response
}

/// Parse the `limit` query value. Anything missing, non-numeric or below 1
/// falls back to [`DEFAULT_LIMIT`].
pub fn clamp_limit(raw: Option<&str>) -> NonZeroUsize {
  raw
    .and_then(|s| s.trim().parse::<i64>().ok())
    .and_then(|n| usize::try_from(n).ok())
    .and_then(NonZeroUsize::new)
    .unwrap_or(DEFAULT_LIMIT)
}

/// `<path without one trailing slash>/<id>`
pub fn location_for(request_path: &str, id: &str) -> String {
  let base = request_path.strip_suffix('/').unwrap_or(request_path);
  format!("{base}/{id}")
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /[?limit=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<Vec<(String, String)>>,
) -> Response
where
  S: CatalogStore + 'static,
{
  let raw = params
    .iter()
    .find(|(k, _)| k == "limit")
    .map(|(_, v)| v.as_str());
  let limit = clamp_limit(raw);
  tracing::debug!(limit = limit.get(), "limiting results");

  let result = match state.store.list(state.context(), limit).await {
    Ok(books) => respond(StatusCode::OK, &books),
    Err(e) => Err(ApiError::store(e)),
  };
  finish("List", result)
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Response
where
  S: CatalogStore + 'static,
{
  let result = match state.store.get(state.context(), &id).await {
    Ok(book) => respond(StatusCode::OK, &book),
    Err(e) => Err(ApiError::store(e)),
  };
  finish("Get", result)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /`, returns 201, the stored book and its `Location`.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  OriginalUri(uri): OriginalUri,
  body: Result<StrictJson<Book>, ApiError>,
) -> Response
where
  S: CatalogStore + 'static,
{
  let result = async {
    let StrictJson(book) = body?;
    let added = state
      .store
      .add(state.context(), book)
      .await
      .map_err(ApiError::store)?;

    let id = added
      .id
      .as_deref()
      .ok_or_else(|| ApiError::Internal("store returned a book without an id".into()))?;
    let location = HeaderValue::try_from(location_for(uri.path(), id))
      .map_err(|e| ApiError::Internal(format!("location header: {e}")))?;

    respond_with(StatusCode::CREATED, &added, [(header::LOCATION, location)])
  }
  .await;
  finish("Create", result)
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /{id}`, full replace of the stored fields.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  body: Result<StrictJson<Book>, ApiError>,
) -> Response
where
  S: CatalogStore + 'static,
{
  let result = async {
    let StrictJson(book) = body?;
    let updated = state
      .store
      .update(state.context(), &id, book)
      .await
      .map_err(ApiError::store)?;
    respond(StatusCode::OK, &updated)
  }
  .await;
  finish("Update", result)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /{id}`, 204 with no body and no content type.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Response
where
  S: CatalogStore + 'static,
{
  let result = match state.store.remove(state.context(), &id).await {
    Ok(_) => Ok(StatusCode::NO_CONTENT.into_response()),
    Err(e) => Err(ApiError::store(e)),
  };
  finish("Delete", result)
}
