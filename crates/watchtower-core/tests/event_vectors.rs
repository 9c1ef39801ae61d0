//! Stream event wire-format tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use watchtower_core::protocol::catalog::Severity;
use watchtower_core::protocol::event::{HeartbeatEvent, IncidentEvent, StreamEvent};

mod vector_loader;

#[test]
fn parse_incident() {
    let ev: StreamEvent = vector_loader::load("incident.json");
    match ev {
        StreamEvent::Incident(i) => {
            assert_eq!(i.service, "payment-api");
            assert_eq!(i.severity, Severity::Critical);
            assert_eq!(i.timestamp, 1700000000.25);
        }
        other => panic!("expected incident, got {other:?}"),
    }
}

#[test]
fn parse_heartbeat() {
    let ev: StreamEvent = vector_loader::load("heartbeat.json");
    assert_eq!(
        ev,
        StreamEvent::Heartbeat(HeartbeatEvent { timestamp: 1700000005.5 })
    );
}

#[test]
fn unknown_event_type_is_rejected() {
    let s = vector_loader::load_str("event_unknown_type.json");
    assert!(serde_json::from_str::<StreamEvent>(&s).is_err());
}

#[test]
fn incident_encodes_with_type_tag() {
    let ev: StreamEvent = IncidentEvent::critical("db").into();
    let v: serde_json::Value = serde_json::from_str(&ev.to_json().unwrap()).unwrap();
    assert_eq!(v["type"], "incident");
    assert_eq!(v["service"], "db");
    assert_eq!(v["severity"], "critical");
    assert_eq!(v["message"], "db is experiencing issues");
    assert!(v["timestamp"].as_f64().unwrap() > 0.0);
}

#[test]
fn heartbeat_encodes_only_type_and_timestamp() {
    let ev: StreamEvent = HeartbeatEvent { timestamp: 2.0 }.into();
    assert_eq!(ev.to_json().unwrap(), r#"{"type":"heartbeat","timestamp":2.0}"#);
}
