//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use booklibrary_core::{Book, CatalogStore, Context, ErrorKind, StoreError};
use booklibrary_store_sqlite::SqliteStore;
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use thiserror::Error;
use tower::ServiceExt;

use crate::{AppState, Metrics, resource_router, router, service};

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn sqlite_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(Arc::new(store))
}

fn request(method: &str, uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(ct) = content_type {
    builder = builder.header(header::CONTENT_TYPE, ct);
  }
  builder.body(Body::from(body.to_string())).unwrap()
}

async fn send<S>(state: AppState<S>, method: &str, uri: &str, body: Option<Value>) -> Response
where
  S: CatalogStore + 'static,
{
  let req = match body {
    Some(v) => request(method, uri, Some("application/json"), &v.to_string()),
    None => request(method, uri, None, ""),
  };
  router(state).oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: Response) -> String {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

fn book_json(title: &str) -> Value {
  json!({
    "author": "John Doe",
    "title": title,
    "releaseDate": 1_580_554_800,
    "keywords": [{ "keyword": "Go" }, { "keyword": "Test" }],
  })
}

async fn create(state: &AppState<SqliteStore>, title: &str) -> String {
  let resp = send(state.clone(), "POST", "/api/books", Some(book_json(title))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  body_json(resp).await["_id"].as_str().unwrap().to_owned()
}

// ─── Scripted store ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("stub failure ({0})")]
struct StubError(ErrorKind);

impl StoreError for StubError {
  fn kind(&self) -> ErrorKind { self.0 }
}

/// Answers every call with `fail` when set, otherwise with canned data.
/// Records the limit passed to `list` and the time left on the context
/// passed to `get`.
#[derive(Default)]
struct StubStore {
  fail:           Option<ErrorKind>,
  seen_limit:     Mutex<Option<usize>>,
  seen_remaining: Mutex<Option<Option<Duration>>>,
}

impl StubStore {
  fn failing(kind: ErrorKind) -> Self { Self { fail: Some(kind), ..Self::default() } }

  fn outcome<T>(&self, ok: T) -> Result<T, StubError> {
    match self.fail {
      Some(kind) => Err(StubError(kind)),
      None => Ok(ok),
    }
  }

  fn canned(id: &str) -> Book {
    Book::new("Jane Roe", "Stubbed", Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap())
      .with_id(id)
  }
}

impl CatalogStore for StubStore {
  type Error = StubError;

  async fn list(&self, _ctx: Context, limit: std::num::NonZeroUsize) -> Result<Vec<Book>, StubError> {
    *self.seen_limit.lock().unwrap() = Some(limit.get());
    self.outcome(Vec::new())
  }

  async fn get(&self, ctx: Context, id: &str) -> Result<Book, StubError> {
    *self.seen_remaining.lock().unwrap() = Some(ctx.remaining());
    self.outcome(Self::canned(id))
  }

  async fn add(&self, _ctx: Context, book: Book) -> Result<Book, StubError> {
    self.outcome(book.with_id("0123456789abcdef01234567"))
  }

  async fn update(&self, _ctx: Context, id: &str, book: Book) -> Result<Book, StubError> {
    self.outcome(book.with_id(id))
  }

  async fn remove(&self, _ctx: Context, id: &str) -> Result<Book, StubError> {
    self.outcome(Self::canned(id))
  }

  async fn ping(&self, _ctx: Context) -> Result<(), StubError> { self.outcome(()) }
}

fn stub_state(stub: StubStore) -> (AppState<StubStore>, Arc<StubStore>) {
  let store = Arc::new(stub);
  (AppState::new(Arc::clone(&store)), store)
}

// ─── CRUD scenario ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_get_delete_get() {
  let state = sqlite_state().await;

  let resp = send(state.clone(), "POST", "/api/books", Some(book_json("Go"))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
  let location = resp.headers()[header::LOCATION].to_str().unwrap().to_owned();
  let created = body_json(resp).await;
  let id = created["_id"].as_str().unwrap();
  assert_eq!(id.len(), 24);
  assert_eq!(location, format!("/api/books/{id}"));
  assert_eq!(created["releaseDate"], 1_580_554_800);

  let resp = send(state.clone(), "GET", &location, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let fetched = body_json(resp).await;
  assert_eq!(fetched, created);

  let resp = send(state.clone(), "DELETE", &location, None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  assert!(resp.headers().get(header::CONTENT_TYPE).is_none());
  assert_eq!(body_text(resp).await, "");

  let resp = send(state, "GET", &location, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_books_in_insertion_order() {
  let state = sqlite_state().await;
  let first = create(&state, "First").await;
  let second = create(&state, "Second").await;
  create(&state, "Third").await;

  let resp = send(state, "GET", "/api/books?limit=2", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let books = body_json(resp).await;
  let ids: Vec<&str> = books
    .as_array()
    .unwrap()
    .iter()
    .map(|b| b["_id"].as_str().unwrap())
    .collect();
  assert_eq!(ids, [first.as_str(), second.as_str()]);
}

#[tokio::test]
async fn list_on_empty_store_is_an_empty_array() {
  let resp = send(sqlite_state().await, "GET", "/api/books", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
  let state = sqlite_state().await;
  for uri in ["/api/books/000000000000000000000000", "/api/books/not-a-valid-id"] {
    let resp = send(state.clone(), "GET", uri, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "GET {uri}");

    let resp = send(state.clone(), "DELETE", uri, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "DELETE {uri}");

    let resp = send(state.clone(), "PUT", uri, Some(book_json("Nope"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "PUT {uri}");
  }
}

#[tokio::test]
async fn update_keeps_the_path_id() {
  let state = sqlite_state().await;
  let id = create(&state, "Before").await;

  let mut body = book_json("After");
  body["_id"] = json!("ffffffffffffffffffffffff");
  body["keywords"] = json!([]);
  let resp = send(state.clone(), "PUT", &format!("/api/books/{id}"), Some(body)).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let updated = body_json(resp).await;
  assert_eq!(updated["_id"], json!(id));
  assert_eq!(updated["title"], "After");
  assert_eq!(updated["keywords"], json!([]));

  let resp = send(state, "GET", &format!("/api/books/{id}"), None).await;
  assert_eq!(body_json(resp).await["title"], "After");
}

// ─── Request decoding ─────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_field_is_bad_request() {
  let mut body = book_json("Go");
  body["publisher"] = json!("Acme");
  let resp = send(sqlite_state().await, "POST", "/api/books", Some(body)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_keyword_field_is_bad_request() {
  let mut body = book_json("Go");
  body["keywords"] = json!([{ "keyword": "Go", "weight": 3 }]);
  let resp = send(sqlite_state().await, "POST", "/api/books", Some(body)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_or_missing_content_type_is_bad_request() {
  let state = sqlite_state().await;
  let body = book_json("Go").to_string();
  for ct in [Some("text/plain"), None] {
    let req = request("POST", "/api/books", ct, &body);
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{ct:?}");
  }

  let req = request("POST", "/api/books", Some("application/json; charset=utf-8"), &body);
  let resp = router(state).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
  let req = request("POST", "/api/books", Some("application/json"), "{\"author\":");
  let resp = router(sqlite_state().await).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_required_field_is_bad_request() {
  let body = json!({ "author": "John Doe", "title": "No date" });
  let resp = send(sqlite_state().await, "POST", "/api/books", Some(body)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_rejects_what_create_rejects() {
  let state = sqlite_state().await;
  let id = create(&state, "Original").await;
  let uri = format!("/api/books/{id}");

  let mut extra = book_json("Changed");
  extra["publisher"] = json!("Acme");
  let resp = send(state.clone(), "PUT", &uri, Some(extra)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "unknown field");

  let req = request("PUT", &uri, Some("text/plain"), &book_json("Changed").to_string());
  let resp = router(state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "text/plain");

  let req = request("PUT", &uri, Some("application/json"), "{\"title\":");
  let resp = router(state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "malformed json");

  let resp = send(state, "GET", &uri, None).await;
  assert_eq!(body_json(resp).await["title"], "Original");
}

// ─── Limits and failures (stub store) ─────────────────────────────────────────

#[tokio::test]
async fn list_limit_falls_back_to_default() {
  for (query, expected) in [
    ("", 100),
    ("?limit=abc", 100),
    ("?limit=0", 100),
    ("?limit=-3", 100),
    ("?limit=5", 5),
  ] {
    let (state, store) = stub_state(StubStore::default());
    let resp = send(state, "GET", &format!("/api/books{query}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(*store.seen_limit.lock().unwrap(), Some(expected), "{query}");
  }
}

#[tokio::test]
async fn store_failures_map_to_status_codes() {
  for (kind, status) in [
    (ErrorKind::StorageUnavailable, StatusCode::INTERNAL_SERVER_ERROR),
    (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
    (ErrorKind::NotFound, StatusCode::NOT_FOUND),
    (ErrorKind::InvalidId, StatusCode::NOT_FOUND),
  ] {
    let (state, _) = stub_state(StubStore::failing(kind));
    let resp = send(state.clone(), "GET", "/api/books", None).await;
    assert_eq!(resp.status(), status, "list {kind}");

    let resp = send(state, "GET", "/api/books/abc", None).await;
    assert_eq!(resp.status(), status, "get {kind}");
  }
}

#[tokio::test]
async fn failure_body_is_only_the_reason() {
  let (state, _) = stub_state(StubStore::failing(ErrorKind::StorageUnavailable));
  let resp = send(state, "POST", "/api/books", Some(book_json("Go"))).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body_text(resp).await, "Internal Server Error");
}

#[tokio::test]
async fn request_timeout_reaches_the_store() {
  let timeout = Duration::from_secs(2);
  let store = Arc::new(StubStore::default());
  let state = AppState::new(Arc::clone(&store)).with_request_timeout(timeout);

  let resp = send(state, "GET", "/api/books/abc", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let seen = *store.seen_remaining.lock().unwrap();
  let remaining = seen.flatten().expect("context carries a deadline");
  assert!(remaining <= timeout, "{remaining:?}");
  assert!(!remaining.is_zero());
}

#[tokio::test]
async fn without_request_timeout_the_store_sees_no_deadline() {
  let (state, store) = stub_state(StubStore::default());
  send(state, "GET", "/api/books/abc", None).await;
  assert_eq!(*store.seen_remaining.lock().unwrap(), Some(None));
}

// ─── Probes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ready_when_store_answers() {
  let resp = send(sqlite_state().await, "GET", "/healthz/ready", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_text(resp).await, "OK\n");
}

#[tokio::test]
async fn not_ready_when_ping_fails() {
  let (state, _) = stub_state(StubStore::failing(ErrorKind::StorageUnavailable));
  let resp = send(state, "GET", "/healthz/ready", None).await;
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(body_text(resp).await, "");
}

#[tokio::test]
async fn live_ignores_the_store() {
  let (state, _) = stub_state(StubStore::failing(ErrorKind::StorageUnavailable));
  let resp = send(state, "GET", "/healthz/live", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_text(resp).await, "OK\n");
}

// ─── Mounting ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn trailing_slash_reaches_the_collection() {
  let state = sqlite_state().await;
  let req = request("POST", "/api/books/", Some("application/json"), &book_json("Go").to_string());
  let resp = service(state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::CREATED);
  let location = resp.headers()[header::LOCATION].to_str().unwrap().to_owned();
  assert!(location.starts_with("/api/books/"), "{location}");
  assert!(!location.contains("//"), "{location}");

  let resp = service(state).oneshot(request("GET", "/api/books/", None, "")).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn resource_router_mounts_at_root() {
  let state = sqlite_state().await;
  let req = request("POST", "/", Some("application/json"), &book_json("Go").to_string());
  let resp = resource_router(state.clone(), "").oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::CREATED);
  let location = resp.headers()[header::LOCATION].to_str().unwrap().to_owned();
  let id = body_json(resp).await["_id"].as_str().unwrap().to_owned();
  assert_eq!(location, format!("/{id}"));

  let resp = resource_router(state, "")
    .oneshot(request("GET", &location, None, ""))
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
}

// ─── Metrics ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn book_requests_are_counted_and_exported() {
  let state = sqlite_state().await.with_metrics(Metrics::new().unwrap());
  create(&state, "Counted").await;
  send(state.clone(), "GET", "/api/books", None).await;
  send(state.clone(), "GET", "/api/books/000000000000000000000000", None).await;
  send(state.clone(), "GET", "/healthz/live", None).await;

  let resp = send(state, "GET", "/metrics", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let text = body_text(resp).await;
  for line in [
    r#"booklibrary_api_requests_total{code="201",method="POST"} 1"#,
    r#"booklibrary_api_requests_total{code="200",method="GET"} 1"#,
    r#"booklibrary_api_requests_total{code="404",method="GET"} 1"#,
    r#"booklibrary_request_duration_seconds_count{handler="/api/books",method="GET"} 1"#,
    r#"booklibrary_request_duration_seconds_count{handler="/api/books/{id}",method="GET"} 1"#,
    "booklibrary_response_size_bytes_count 3",
    "booklibrary_in_flight_requests 0",
  ] {
    assert!(text.contains(line), "missing {line:?} in:\n{text}");
  }
}

#[tokio::test]
async fn metrics_are_absent_unless_configured() {
  let resp = send(sqlite_state().await, "GET", "/metrics", None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
