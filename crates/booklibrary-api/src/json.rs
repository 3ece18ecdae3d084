//! The shared decode/encode pair for JSON bodies.
//!
//! [`StrictJson`] checks the content type before touching the body and then
//! decodes with the target type's own strictness (the domain types deny
//! unknown fields). [`respond`] always sets `Content-Type: application/json`.

use axum::{
  body::{Body, Bytes},
  extract::{FromRequest, Request},
  http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
  response::Response,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::ApiError;

pub const APPLICATION_JSON: &str = "application/json";

/// `true` when the `Content-Type` media type is `application/json`.
/// Parameters such as `charset` are ignored.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(';').next())
    .is_some_and(|media| media.trim().eq_ignore_ascii_case(APPLICATION_JSON))
}

pub fn decode_strict<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
  serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Request body extractor for `POST`/`PUT`.
#[derive(Debug)]
pub struct StrictJson<T>(pub T);

impl<T, S> FromRequest<S> for StrictJson<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    if !is_json_content_type(req.headers()) {
      return Err(ApiError::BadRequest(format!(
        "unsupported content type, expected {APPLICATION_JSON}"
      )));
    }
    let body = Bytes::from_request(req, state)
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    decode_strict(&body).map(StrictJson)
  }
}

/// Encode `value` as the JSON body of a `status` response.
pub fn respond<T: Serialize>(status: StatusCode, value: &T) -> Result<Response, ApiError> {
  respond_with(status, value, std::iter::empty())
}

pub fn respond_with<T, I>(
  status: StatusCode,
  value: &T,
  headers: I,
) -> Result<Response, ApiError>
where
  T: Serialize,
  I: IntoIterator<Item = (HeaderName, HeaderValue)>,
{
  let body = serde_json::to_vec(value)
    .map_err(|e| ApiError::Internal(format!("encoding response: {e}")))?;

  let mut builder = Response::builder().status(status);
  for (name, value) in headers {
    builder = builder.header(name, value);
  }
  builder
    .header(header::CONTENT_TYPE, APPLICATION_JSON)
    .body(Body::from(body))
    .map_err(|e| ApiError::Internal(format!("building response: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn headers(content_type: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
    h
  }

  #[test]
  fn json_content_type_variants() {
    assert!(is_json_content_type(&headers("application/json")));
    assert!(is_json_content_type(&headers("application/json; charset=utf-8")));
    assert!(is_json_content_type(&headers("Application/JSON")));
    assert!(!is_json_content_type(&headers("text/plain")));
    assert!(!is_json_content_type(&headers("application/jsonp")));
    assert!(!is_json_content_type(&HeaderMap::new()));
  }

  #[test]
  fn respond_sets_content_type() {
    let resp = respond(StatusCode::OK, &vec![1, 2, 3]).unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
  }

  #[test]
  fn decode_strict_reports_bad_request() {
    let err = decode_strict::<Vec<u8>>(b"{not json").unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
  }
}
