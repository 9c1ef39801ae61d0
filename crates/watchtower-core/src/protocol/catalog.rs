//! Read-only service and alert records.

use serde::{Deserialize, Serialize};

/// Health state reported for a monitored service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl ServiceStatus {
    /// Value exported on the service health gauge (1 = healthy, 0 otherwise).
    pub fn gauge_value(self) -> f64 {
        match self {
            ServiceStatus::Healthy => 1.0,
            ServiceStatus::Degraded | ServiceStatus::Unhealthy => 0.0,
        }
    }
}

/// A monitored service as listed by `GET /api/services`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    pub id: u32,
    pub name: String,
    pub status: ServiceStatus,
    /// Uptime percentage in `0.0..=100.0`.
    pub uptime: f64,
    /// Unix seconds of the most recent check.
    pub last_check: f64,
}

/// Alert severity. Also used by streamed incidents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Resolved,
}

/// An alert as listed by `GET /api/alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Alert {
    pub id: u32,
    pub severity: Severity,
    /// Name of the service the alert belongs to.
    pub service: String,
    pub message: String,
    pub timestamp: f64,
    pub status: AlertStatus,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}
