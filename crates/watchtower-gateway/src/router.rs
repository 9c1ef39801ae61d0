//! Axum router wiring.
//!
//! Layer order, outermost first: request tracing, panic-to-500, request
//! metrics, CORS. `Router::layer` wraps each route, so the metrics middleware
//! still sees the matched route template. It sits outside CORS so preflight
//! requests answered by the CORS layer are counted too, and inside the panic
//! layer so a panicking handler is recorded before it becomes a 500.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use watchtower_core::error::Result;

use crate::{
    api::{monitor, ops},
    app_state::AppState,
    config::ServerSection,
    obs::middleware::track_requests,
    transport,
};

/// Credentialed CORS for the configured origins. Credentials rule out `*`,
/// so methods and headers mirror what the preflight asks for.
pub fn cors_layer(server: &ServerSection) -> Result<CorsLayer> {
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(server.cors_header_values()?))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

pub fn build_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.cfg().server)?;

    Ok(Router::new()
        .route("/", get(ops::root))
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route("/api/services", get(monitor::list_services))
        .route("/api/alerts", get(monitor::list_alerts))
        .route("/api/simulate-incident", post(monitor::simulate_incident))
        .route("/ws/alerts", get(transport::ws::ws_alerts))
        .fallback(ops::not_found)
        .layer(cors)
        .layer(middleware::from_fn_with_state(state.metrics(), track_requests))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
