//! Route registration and HTTP middleware.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod analytics;
pub mod customers;
pub mod health;
pub mod locations;
pub mod loyalty;
pub mod products;
pub mod settings;
pub mod system_settings;
pub mod transactions;

/// Build a router with all resource routes registered (no middleware).
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(customers::router())
        .merge(loyalty::router())
        .merge(transactions::router())
        .merge(locations::router())
        .merge(settings::router())
        .merge(system_settings::router())
        .merge(analytics::router())
        .merge(health::router())
}

/// Build the fully configured application with middleware and state.
///
/// The web client is served from a different origin in development,
/// so CORS stays permissive; request tracing logs method/path/status
/// at the `tower_http` target.
pub fn build_app(state: AppState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
