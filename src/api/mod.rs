//! API module
//!
//! HTTP endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::statistics::StatisticsService;

pub use routes::create_router;

/// Build the application router
pub fn build_router(service: StatisticsService) -> Router {
    // Layers run outermost first: request id -> trace -> logging -> handler
    let api_router = create_router().layer(axum::middleware::from_fn(middleware::logging_middleware));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(service)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
