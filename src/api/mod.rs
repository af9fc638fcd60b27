//! REST API over the record store
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **RecordFacade** for every read and write; handlers hold no logic of their own
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Store health
//! - `GET /api/v1/stats` - Collection counts
//! - `GET|POST /api/v1/monitors` - List / add-only create
//! - `GET|PUT|DELETE /api/v1/monitors/:name` - Read / upsert / delete
//! - `GET /api/v1/monitors/export?names=a,b` - CSV export
//! - `POST /api/v1/monitors/import` - CSV import
//! - the same six routes under `/api/v1/services`
//! - `GET /api/v1/schedule` and `GET /api/v1/schedule/export` - Derived schedule

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{DeleteResponse, ExportQuery, HealthResponse, StatsResponse};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use crate::config::ApiConfig;

/// Build the router with all routes
pub fn router(state: ApiState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .route(
            "/api/v1/monitors",
            get(routes::monitors::list_monitors).post(routes::monitors::create_monitor),
        )
        .route(
            "/api/v1/monitors/export",
            get(routes::monitors::export_monitors),
        )
        .route(
            "/api/v1/monitors/import",
            post(routes::monitors::import_monitors),
        )
        .route(
            "/api/v1/monitors/:name",
            get(routes::monitors::get_monitor)
                .put(routes::monitors::save_monitor)
                .delete(routes::monitors::delete_monitor),
        )
        .route(
            "/api/v1/services",
            get(routes::services::list_services).post(routes::services::create_service),
        )
        .route(
            "/api/v1/services/export",
            get(routes::services::export_services),
        )
        .route(
            "/api/v1/services/import",
            post(routes::services::import_services),
        )
        .route(
            "/api/v1/services/:name",
            get(routes::services::get_service)
                .put(routes::services::save_service)
                .delete(routes::services::delete_service),
        )
        .route("/api/v1/schedule", get(routes::schedule::list_schedule))
        .route(
            "/api/v1/schedule/export",
            get(routes::schedule::export_schedule),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: &ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind);

    let app = router(state, config.enable_cors);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
