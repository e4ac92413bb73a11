//! # Atelier Server
//!
//! Game server for Atelier: serves the movement catalog, advisory scoring,
//! authoritative artwork saves, galleries, and leaderboards.
//! Binds to localhost only for security.

use std::net::SocketAddr;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atelier_core::MovementCatalog;
use atelier_server::{health, metrics, routes, AppState, GameStore};
use metrics_exporter_prometheus::PrometheusHandle;

/// Default port for the game server.
const DEFAULT_PORT: u16 = 2835; // "ATEL" on phone keypad

/// Build a CORS layer that only allows localhost origins.
///
/// This is a security measure to ensure the server only accepts requests from
/// the local machine; a production deployment fronts it with its own ingress.
fn build_cors_layer(port: u16) -> CorsLayer {
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        // Also allow common development ports for dev servers
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(), // Vite
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,atelier_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output (recommended for production).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atelier_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Build the full application router.
fn build_router(state: AppState, metrics_handle: PrometheusHandle, port: u16) -> Router {
    Router::new()
        .nest("/api", routes::api_router())
        .route("/health", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/metrics",
            get(move || async move { metrics_handle.render() }),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(build_cors_layer(port))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {}", e))?;
    tracing::info!("Prometheus metrics initialized");

    let port = std::env::var("ATELIER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let catalog = MovementCatalog::builtin();
    tracing::info!(movements = catalog.len(), "movement catalog loaded");

    // Optional transaction persistence
    let store = match std::env::var("ATELIER_DATA_DIR") {
        Ok(dir) if !dir.is_empty() => {
            tracing::info!(data_dir = %dir, "persistence enabled");
            GameStore::with_data_dir(catalog, dir)?
        }
        _ => {
            tracing::warn!("ATELIER_DATA_DIR not set; running without persistence");
            GameStore::new(catalog)
        }
    };

    let state = AppState::new(store);
    let app = build_router(state, metrics_handle, port);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Atelier server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
