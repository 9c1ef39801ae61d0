//! Request instrumentation middleware.
//!
//! Wraps every routed request: times the downstream handler and records
//! `http_request_duration_seconds{method, endpoint}` plus
//! `http_requests_total{method, endpoint, status}`. `endpoint` is the route
//! template (`/api/services`), never the raw URI, so label cardinality stays
//! bounded.
//!
//! A handler that panics has no status; it is recorded as `500` and the panic
//! is resumed untouched for the outer `CatchPanicLayer` to turn into a
//! response.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;

use crate::obs::{MetricsRegistry, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION};

/// Endpoint label for requests no route matched.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

pub async fn track_requests(
    State(metrics): State<Arc<MetricsRegistry>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_owned());

    let outcome = AssertUnwindSafe(next.run(req)).catch_unwind().await;

    let status = match &outcome {
        Ok(resp) => resp.status().as_u16(),
        Err(_) => {
            tracing::error!(%method, %endpoint, "handler panicked");
            500
        }
    };
    record_request(&metrics, &method, &endpoint, status, start);

    match outcome {
        Ok(resp) => resp,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Record one finished request.
pub fn record_request(metrics: &MetricsRegistry, method: &str, endpoint: &str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics.observe_duration(
        HTTP_REQUEST_DURATION,
        &[("method", method), ("endpoint", endpoint)],
        start.elapsed().as_secs_f64(),
    );
    metrics.increment_counter(
        HTTP_REQUESTS_TOTAL,
        &[("method", method), ("endpoint", endpoint), ("status", status.as_str())],
    );
}
