//! Operational HTTP endpoints.
//!
//! - `/`        : API banner with the endpoint map
//! - `/health`  : liveness
//! - `/metrics` : Prometheus text format
//! - fallback   : JSON 404

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use watchtower_core::error::WatchtowerError;
use watchtower_core::protocol::unix_now;

use crate::api::ApiError;
use crate::app_state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Intelligent Monitoring Platform API",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "metrics": "/metrics",
            "alerts": "/api/alerts",
            "services": "/api/services",
            "simulate_incident": "/api/simulate-incident",
            "stream": "/ws/alerts"
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": unix_now(),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError(WatchtowerError::NotFound(uri.path().to_owned()))
}
