//! Analytics API: the dashboard snapshot, recomputed on every request.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use meridian_db::AnalyticsSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/analytics", get(snapshot))
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    /// Scope revenue/transaction figures to one location.
    location_id: Option<String>,
    low_stock_threshold: Option<i64>,
}

/// GET /api/analytics - global or per-location aggregate
async fn snapshot(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSnapshot>, ApiError> {
    if let Some(location_id) = &query.location_id {
        state
            .db
            .locations()
            .get_by_id(location_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Location", location_id))?;
    }

    let threshold = query
        .low_stock_threshold
        .unwrap_or(meridian_core::DEFAULT_LOW_STOCK_THRESHOLD);

    let snapshot = state
        .db
        .analytics()
        .snapshot(query.location_id.as_deref(), threshold)
        .await?;

    Ok(Json(snapshot))
}
