//! formgate API /v1: REST endpoints
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use error::{ApiError, LoadError};
pub use state::{AppState, HostedForm};

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(handlers::health))
        .route("/v1/forms/{id}", get(handlers::get_form))
        .route("/v1/forms/{id}/submit", post(handlers::submit))
        .route("/v1/audit/stats", get(handlers::audit_stats))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::request_log))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let app = create_app(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("formgate API listening on {}", addr);
    axum::serve(listener, app).await
}
