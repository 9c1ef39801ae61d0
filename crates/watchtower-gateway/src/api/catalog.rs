//! Static service and alert data.
//!
//! There is no probing behind these records; timestamps are filled in at
//! request time so the dashboard sees fresh checks.

use watchtower_core::protocol::catalog::{Alert, AlertStatus, Service, ServiceStatus, Severity};

pub fn services(now: f64) -> Vec<Service> {
    [("payment-api", 99.9), ("user-service", 99.5), ("database", 100.0)]
        .into_iter()
        .zip(1..)
        .map(|((name, uptime), id)| Service {
            id,
            name: name.to_string(),
            status: ServiceStatus::Healthy,
            uptime,
            last_check: now,
        })
        .collect()
}

pub fn alerts(now: f64) -> Vec<Alert> {
    vec![Alert {
        id: 1,
        severity: Severity::Warning,
        service: "payment-api".into(),
        message: "High response time detected".into(),
        timestamp: now - 300.0,
        status: AlertStatus::Active,
    }]
}
