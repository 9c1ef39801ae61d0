//! End-to-end alert stream tests against a real listener.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use axum::Router;
use futures_util::future::join_all;
use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use watchtower_core::protocol::event::{IncidentEvent, StreamEvent};
use watchtower_gateway::app_state::AppState;
use watchtower_gateway::obs;
use watchtower_gateway::router::build_router;

mod common;
use common::{request, test_config, test_state, wait_until};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const PATIENCE: Duration = Duration::from_secs(3);

async fn spawn_server(state: AppState) -> (SocketAddr, Router) {
    let app = build_router(state).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });
    (addr, app)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws/alerts")).await.unwrap();
    ws
}

async fn wait_for_connections(state: &AppState, n: usize) {
    let connections = state.connections();
    assert!(
        wait_until(PATIENCE, || {
            let connections = connections.clone();
            async move { connections.len() == n }
        })
        .await,
        "expected {n} registered streams, have {}",
        connections.len()
    );
}

/// Next text frame decoded as an event.
async fn next_event(ws: &mut Client) -> StreamEvent {
    loop {
        let msg = tokio::time::timeout(PATIENCE, ws.next())
            .await
            .expect("no frame before timeout")
            .expect("stream ended")
            .unwrap();
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

/// Skip heartbeats until an incident shows up.
async fn next_incident(ws: &mut Client) -> StreamEvent {
    loop {
        let ev = next_event(ws).await;
        if matches!(ev, StreamEvent::Incident(_)) {
            return ev;
        }
    }
}

#[tokio::test]
async fn heartbeat_flows_and_close_unregisters() {
    let state = test_state();
    let (addr, _app) = spawn_server(state.clone()).await;

    let mut ws = connect(addr).await;
    wait_for_connections(&state, 1).await;
    assert_eq!(state.metrics().gauge_value(obs::REALTIME_CONNECTIONS, &[]), Some(1.0));

    for _ in 0..2 {
        match next_event(&mut ws).await {
            StreamEvent::Heartbeat(hb) => assert!(hb.timestamp > 0.0),
            other => panic!("expected heartbeat, got {other:?}"),
        }
    }

    ws.close(None).await.unwrap();
    wait_for_connections(&state, 0).await;
    assert_eq!(state.metrics().gauge_value(obs::REALTIME_CONNECTIONS, &[]), Some(0.0));
}

#[tokio::test]
async fn incident_reaches_every_open_stream() {
    let state = test_state();
    let (addr, app) = spawn_server(state.clone()).await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_connections(&state, 2).await;

    let resp = app
        .oneshot(request(Method::POST, "/api/simulate-incident?service_name=database"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    for ws in [&mut a, &mut b] {
        match next_incident(ws).await {
            StreamEvent::Incident(i) => assert_eq!(i.service, "database"),
            other => panic!("expected incident, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn dropped_client_does_not_block_others() {
    let state = test_state();
    let (addr, app) = spawn_server(state.clone()).await;

    let gone = connect(addr).await;
    let mut alive = connect(addr).await;
    wait_for_connections(&state, 2).await;

    drop(gone);
    wait_for_connections(&state, 1).await;

    let resp = app
        .oneshot(request(Method::POST, "/api/simulate-incident?service_name=user-service"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    match next_incident(&mut alive).await {
        StreamEvent::Incident(i) => assert_eq!(i.service, "user-service"),
        other => panic!("expected incident, got {other:?}"),
    }
}

#[tokio::test]
async fn upgrade_beyond_connection_limit_is_refused() {
    let mut cfg = test_config();
    cfg.realtime.max_connections = 1;
    let state = AppState::new(cfg).unwrap();
    let (addr, _app) = spawn_server(state.clone()).await;

    let _first = connect(addr).await;
    wait_for_connections(&state, 1).await;

    match connect_async(format!("ws://{addr}/ws/alerts")).await {
        Err(WsError::Http(resp)) => assert_eq!(resp.status().as_u16(), 503),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("second stream must be refused"),
    }
    assert_eq!(state.connections().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_handshakes_never_exceed_connection_limit() {
    let mut cfg = test_config();
    cfg.realtime.max_connections = 1;
    let state = AppState::new(cfg).unwrap();
    let (addr, _app) = spawn_server(state.clone()).await;

    let url = format!("ws://{addr}/ws/alerts");
    let attempts = (0..64).map(|_| tokio::spawn(connect_async(url.clone())));

    let mut accepted = Vec::new();
    let mut refused = 0;
    for outcome in join_all(attempts).await {
        match outcome.unwrap() {
            Ok((ws, _)) => accepted.push(ws),
            Err(WsError::Http(resp)) => {
                assert_eq!(resp.status().as_u16(), 503);
                refused += 1;
            }
            Err(other) => panic!("unexpected error {other}"),
        }
    }

    assert_eq!(accepted.len(), 1);
    assert_eq!(refused, 63);
    wait_for_connections(&state, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(state.connections().len(), 1);
    assert_eq!(state.metrics().gauge_value(obs::REALTIME_CONNECTIONS, &[]), Some(1.0));
}

#[tokio::test]
async fn steady_broadcasts_suppress_heartbeats() {
    // heartbeat interval is 150ms; broadcasts arrive every 50ms
    let state = test_state();
    let (addr, _app) = spawn_server(state.clone()).await;

    let mut ws = connect(addr).await;
    wait_for_connections(&state, 1).await;

    let connections = state.connections();
    let pusher = tokio::spawn(async move {
        for i in 0..10 {
            let event = StreamEvent::from(IncidentEvent::critical(format!("svc-{i}")));
            connections.broadcast(&event).await;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });

    for i in 0..10 {
        match next_event(&mut ws).await {
            StreamEvent::Incident(inc) => assert_eq!(inc.service, format!("svc-{i}")),
            other => panic!("expected incident svc-{i}, got {other:?}"),
        }
    }
    pusher.await.unwrap();

    // once the broadcasts stop, heartbeats resume
    match next_event(&mut ws).await {
        StreamEvent::Heartbeat(_) => {}
        other => panic!("expected heartbeat, got {other:?}"),
    }
}

#[tokio::test]
async fn registry_eviction_closes_the_stream() {
    let mut cfg = test_config();
    cfg.realtime.max_connections = 1;
    let state = AppState::new(cfg).unwrap();
    let (addr, _app) = spawn_server(state.clone()).await;

    let mut ws = connect(addr).await;
    wait_for_connections(&state, 1).await;

    assert_eq!(state.connections().close_all(), 1);

    let closed = tokio::time::timeout(PATIENCE, async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "client never saw the stream close");
    assert!(state.connections().is_empty());
    assert_eq!(state.metrics().gauge_value(obs::REALTIME_CONNECTIONS, &[]), Some(0.0));

    // the session released its slot, so a new stream fits under the cap
    let slots = state.stream_slots();
    assert!(
        wait_until(PATIENCE, || {
            let slots = slots.clone();
            async move { slots.available_permits() == 1 }
        })
        .await
    );
    let _again = connect(addr).await;
    wait_for_connections(&state, 1).await;
}
