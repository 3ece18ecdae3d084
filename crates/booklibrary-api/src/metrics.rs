//! Prometheus instrumentation for the book routes and the `/metrics` export.

use std::time::Instant;

use axum::{
  body::HttpBody as _,
  extract::{MatchedPath, Request, State},
  http::{StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use prometheus::{
  Encoder as _, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge,
  Opts, Registry, TextEncoder,
};

/// Request metrics, each [`Metrics`] with its own registry.
#[derive(Clone)]
pub struct Metrics {
  registry:      Registry,
  in_flight:     IntGauge,
  requests:      IntCounterVec,
  duration:      HistogramVec,
  response_size: Histogram,
}

impl Metrics {
  pub fn new() -> prometheus::Result<Self> {
    let in_flight = IntGauge::new(
      "booklibrary_in_flight_requests",
      "Requests currently being served by the book API.",
    )?;
    let requests = IntCounterVec::new(
      Opts::new("booklibrary_api_requests_total", "Requests to the book API."),
      &["code", "method"],
    )?;
    let duration = HistogramVec::new(
      HistogramOpts::new(
        "booklibrary_request_duration_seconds",
        "Latency of book API requests.",
      )
      .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
      &["handler", "method"],
    )?;
    let response_size = Histogram::with_opts(
      HistogramOpts::new(
        "booklibrary_response_size_bytes",
        "Size of book API response bodies.",
      )
      .buckets(vec![200.0, 500.0, 900.0, 1500.0]),
    )?;

    let registry = Registry::new();
    registry.register(Box::new(in_flight.clone()))?;
    registry.register(Box::new(requests.clone()))?;
    registry.register(Box::new(duration.clone()))?;
    registry.register(Box::new(response_size.clone()))?;

    Ok(Self { registry, in_flight, requests, duration, response_size })
  }
}

/// Decrements the in-flight gauge even when the request future is dropped.
struct InFlight(IntGauge);

impl InFlight {
  fn enter(gauge: &IntGauge) -> Self {
    gauge.inc();
    Self(gauge.clone())
  }
}

impl Drop for InFlight {
  fn drop(&mut self) { self.0.dec(); }
}

/// Route-layer middleware recording one request.
pub async fn track(State(metrics): State<Metrics>, request: Request, next: Next) -> Response {
  let method = request.method().as_str().to_owned();
  let handler = request
    .extensions()
    .get::<MatchedPath>()
    .map(|p| p.as_str().to_owned())
    .unwrap_or_default();

  let _in_flight = InFlight::enter(&metrics.in_flight);
  let started = Instant::now();
  let response = next.run(request).await;

  metrics
    .duration
    .with_label_values(&[handler.as_str(), method.as_str()])
    .observe(started.elapsed().as_secs_f64());
  metrics
    .requests
    .with_label_values(&[response.status().as_str(), method.as_str()])
    .inc();
  let size = response.body().size_hint();
  metrics
    .response_size
    .observe(size.exact().unwrap_or(size.lower()) as f64);

  response
}

/// `GET /metrics` in the Prometheus text format.
pub async fn export(State(metrics): State<Metrics>) -> Response {
  let encoder = TextEncoder::new();
  let mut buf = Vec::new();
  match encoder.encode(&metrics.registry.gather(), &mut buf) {
    Ok(()) => {
      ([(header::CONTENT_TYPE, encoder.format_type().to_owned())], buf).into_response()
    }
    Err(e) => {
      tracing::error!(error = %e, "encoding metrics");
      StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
  }
}
