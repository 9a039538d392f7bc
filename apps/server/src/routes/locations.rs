//! Location API: store list and per-location settings admin.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use meridian_core::validation::{validate_name, validate_store_code, validate_tax_rate};
use meridian_core::{Location, TaxRate};
use meridian_db::LocationUpdate;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/locations", get(list).post(create))
        .route("/api/locations/{id}", put(update))
        .route("/api/locations/{id}/logo", put(update_logo))
}

/// GET /api/locations
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Location>>, ApiError> {
    let locations = state.db.locations().list().await?;
    Ok(Json(locations))
}

#[derive(Debug, Deserialize)]
struct CreateLocationRequest {
    store_code: String,
    name: String,
    brand: Option<String>,
    address: Option<String>,
    manager: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    /// Decimal fraction in [0, 1]; stored as basis points.
    tax_rate: Option<f64>,
}

/// POST /api/locations
async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateLocationRequest>,
) -> Result<Json<Location>, ApiError> {
    let store_code = request.store_code.trim().to_string();
    validate_store_code(&store_code)?;
    validate_name("name", &request.name)?;

    let tax_rate_bps = match request.tax_rate {
        Some(rate) => {
            validate_tax_rate(rate)?;
            Some(TaxRate::from_decimal(rate).bps())
        }
        None => None,
    };

    let now = Utc::now();
    let location = Location {
        id: Uuid::new_v4().to_string(),
        store_code,
        name: request.name.trim().to_string(),
        brand: request.brand,
        address: request.address,
        manager: request.manager,
        logo_url: None,
        phone: request.phone,
        email: request.email,
        tax_rate_bps,
        created_at: now,
        updated_at: now,
    };

    state.db.locations().insert(&location).await?;

    Ok(Json(location))
}

#[derive(Debug, Deserialize)]
struct UpdateLocationRequest {
    name: String,
    brand: Option<String>,
    address: Option<String>,
    manager: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    tax_rate: Option<f64>,
}

/// PUT /api/locations/{id} - the store code itself is immutable
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<Location>, ApiError> {
    validate_name("name", &request.name)?;

    let tax_rate_bps = match request.tax_rate {
        Some(rate) => {
            validate_tax_rate(rate)?;
            Some(TaxRate::from_decimal(rate).bps())
        }
        None => None,
    };

    let location = state
        .db
        .locations()
        .update(
            &id,
            &LocationUpdate {
                name: request.name.trim().to_string(),
                brand: request.brand,
                address: request.address,
                manager: request.manager,
                phone: request.phone,
                email: request.email,
                tax_rate_bps,
            },
        )
        .await?;

    Ok(Json(location))
}

#[derive(Debug, Deserialize)]
struct LogoRequest {
    logo_url: Option<String>,
}

/// PUT /api/locations/{id}/logo
async fn update_logo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<LogoRequest>,
) -> Result<Json<Location>, ApiError> {
    let location = state
        .db
        .locations()
        .update_logo(&id, request.logo_url.as_deref())
        .await?;

    Ok(Json(location))
}
