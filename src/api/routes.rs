//! API Routes
//!
//! Read-only statistics endpoints.

use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};

use crate::domain::SiteStatistics;
use crate::error::AppResult;
use crate::statistics::StatisticsService;

/// Create the API router
pub fn create_router() -> Router<StatisticsService> {
    Router::new()
        .route("/statistics", get(get_statistics))
        .route("/statistics/display", get(get_statistics_display))
}

/// GET /statistics
///
/// Current snapshot as raw counters.
async fn get_statistics(State(service): State<StatisticsService>) -> AppResult<Json<SiteStatistics>> {
    let stats = service.snapshot().await?;
    Ok(Json(stats))
}

/// GET /statistics/display
///
/// Same snapshot with values formatted for the site (`1 234`, `2.5M`).
async fn get_statistics_display(
    State(service): State<StatisticsService>,
) -> AppResult<Json<BTreeMap<&'static str, String>>> {
    let stats = service.snapshot().await?;
    Ok(Json(stats.formatted()))
}
