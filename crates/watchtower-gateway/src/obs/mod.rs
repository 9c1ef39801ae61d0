//! Observability: metrics registry, request instrumentation, logging setup.
//!
//! Metrics are stored as atomics inside an explicitly constructed
//! [`MetricsRegistry`] and rendered by the `/metrics` handler.

pub mod logging;
pub mod metrics;
pub mod middleware;

pub use metrics::{Labels, MetricKind, MetricsRegistry};

/// `http_requests_total{method, endpoint, status}`
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
/// `http_request_duration_seconds{method, endpoint}`
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";
/// `active_alerts_total`
pub const ACTIVE_ALERTS: &str = "active_alerts_total";
/// `service_health_status{service_name}`
pub const SERVICE_HEALTH: &str = "service_health_status";
/// `realtime_connections_active`
pub const REALTIME_CONNECTIONS: &str = "realtime_connections_active";
/// `realtime_broadcast_failures_total{reason}`
pub const REALTIME_BROADCAST_FAILURES: &str = "realtime_broadcast_failures_total";

/// Registry with every gateway family registered up front, so `/metrics`
/// lists them in a stable order from the first scrape.
pub fn gateway_registry() -> MetricsRegistry {
    let reg = MetricsRegistry::new();
    reg.register_counter(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    reg.register_histogram(HTTP_REQUEST_DURATION, "HTTP request duration");
    reg.register_gauge(ACTIVE_ALERTS, "Number of active alerts");
    reg.register_gauge(SERVICE_HEALTH, "Service health status (1=healthy, 0=unhealthy)");
    reg.register_gauge(REALTIME_CONNECTIONS, "Open alert stream connections");
    reg.register_counter(REALTIME_BROADCAST_FAILURES, "Broadcast deliveries that dropped a connection");
    reg
}
