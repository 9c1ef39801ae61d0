//! Monitoring endpoints backed by the static catalog.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use watchtower_core::error::WatchtowerError;
use watchtower_core::protocol::catalog::{Alert, Service};
use watchtower_core::protocol::event::{IncidentEvent, StreamEvent};
use watchtower_core::protocol::unix_now;

use crate::api::{catalog, ApiError};
use crate::app_state::AppState;
use crate::obs::{ACTIVE_ALERTS, SERVICE_HEALTH};

/// Longest accepted `service_name`; it becomes a metric label.
pub const MAX_SERVICE_NAME_LEN: usize = 128;

pub async fn list_services(State(app): State<AppState>) -> Json<Vec<Service>> {
    let services = catalog::services(unix_now());
    let metrics = app.metrics();
    for s in &services {
        metrics.set_gauge(SERVICE_HEALTH, &[("service_name", s.name.as_str())], s.status.gauge_value());
    }
    Json(services)
}

pub async fn list_alerts(State(app): State<AppState>) -> Json<Vec<Alert>> {
    let alerts = catalog::alerts(unix_now());
    app.metrics().set_gauge(ACTIVE_ALERTS, &[], alerts.len() as f64);
    Json(alerts)
}

#[derive(Debug, Deserialize)]
pub struct IncidentQuery {
    pub service_name: String,
}

/// The name is used as given; it is never rewritten.
fn validate_service_name(name: &str) -> Result<&str, WatchtowerError> {
    if name.trim().is_empty() {
        return Err(WatchtowerError::BadRequest("service_name must not be empty".into()));
    }
    if name.trim() != name {
        return Err(WatchtowerError::BadRequest(
            "service_name must not start or end with whitespace".into(),
        ));
    }
    if name.len() > MAX_SERVICE_NAME_LEN {
        return Err(WatchtowerError::BadRequest(format!(
            "service_name longer than {MAX_SERVICE_NAME_LEN} bytes"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(WatchtowerError::BadRequest(
            "service_name must not contain control characters".into(),
        ));
    }
    Ok(name)
}

/// Broadcast a critical incident for `service_name` and mark it unhealthy.
///
/// The parameter is validated before anything else runs; a rejected request
/// leaves the gauges and the streams untouched.
pub async fn simulate_incident(
    State(app): State<AppState>,
    query: Result<Query<IncidentQuery>, QueryRejection>,
) -> Result<Json<StreamEvent>, ApiError> {
    let Query(q) = query.map_err(|e| WatchtowerError::BadRequest(e.body_text()))?;
    let service = validate_service_name(&q.service_name)?;

    let incident = StreamEvent::from(IncidentEvent::critical(service));
    let report = app.connections().broadcast(&incident).await;

    let metrics = app.metrics();
    metrics.set_gauge(SERVICE_HEALTH, &[("service_name", service)], 0.0);
    metrics.increment_gauge(ACTIVE_ALERTS, &[]);

    tracing::info!(
        service,
        delivered = report.delivered,
        failed = report.failed(),
        "incident simulated"
    );
    Ok(Json(incident))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_name_is_kept_verbatim() {
        assert_eq!(validate_service_name("payment-api").ok(), Some("payment-api"));
        assert_eq!(validate_service_name("user service").ok(), Some("user service"));
    }

    #[test]
    fn surrounding_whitespace_is_rejected_not_stripped() {
        assert!(validate_service_name(" db").is_err());
        assert!(validate_service_name("db\t").is_err());
    }

    #[test]
    fn blank_or_oversized_names_are_rejected() {
        assert!(validate_service_name("   ").is_err());
        assert!(validate_service_name(&"x".repeat(MAX_SERVICE_NAME_LEN + 1)).is_err());
        assert!(validate_service_name("a\nb").is_err());
    }
}
