//! Customer API: listing, enrollment, lookup, search, history.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use meridian_core::loyalty::{normalize_loyalty_number, validate_loyalty_number};
use meridian_core::validation::{validate_name, validate_search_query};
use meridian_core::{Customer, LoyaltyTier, MembershipStatus, Transaction};
use meridian_db::NewCustomer;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/customers", customer_routes())
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/by-number/{loyalty_number}", get(get_by_loyalty_number))
        .route("/{id}", put(update))
        .route("/{id}/history", get(purchase_history))
}

/// GET /api/customers
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = state.db.customers().list().await?;
    Ok(Json(customers))
}

/// Enrollment payload shared with the loyalty checkout flow.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Optional: pre-filled from the register when a lookup missed.
    /// Server-generated when absent.
    pub loyalty_number: Option<String>,
}

/// Validates and runs an enrollment; shared by this module and the
/// loyalty routes.
pub async fn enroll_customer(
    state: &AppState,
    request: EnrollRequest,
) -> Result<Customer, ApiError> {
    validate_name("name", &request.name)?;

    let loyalty_number = match request.loyalty_number {
        Some(number) => {
            let number = normalize_loyalty_number(&number);
            validate_loyalty_number(&number)?;
            Some(number)
        }
        None => None,
    };

    let customer = state
        .db
        .customers()
        .enroll(&NewCustomer {
            name: request.name.trim().to_string(),
            email: request.email,
            phone: request.phone,
            loyalty_number,
        })
        .await?;

    Ok(customer)
}

/// POST /api/customers
async fn create(
    State(state): State<AppState>,
    Json(request): Json<EnrollRequest>,
) -> Result<Json<Customer>, ApiError> {
    let customer = enroll_customer(&state, request).await?;
    Ok(Json(customer))
}

#[derive(Debug, Deserialize)]
struct UpdateCustomerRequest {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    #[serde(default)]
    status: MembershipStatus,
    /// Present = pin the tier manually; absent = let accrual
    /// recalculate it from lifetime spend.
    tier: Option<LoyaltyTier>,
}

/// PUT /api/customers/{id} - admin profile edit
///
/// The loyalty number is immutable and cannot be changed here.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    validate_name("name", &request.name)?;

    let customer = state
        .db
        .customers()
        .update_profile(
            &id,
            request.name.trim(),
            request.email.as_deref(),
            request.phone.as_deref(),
            request.status,
            request.tier,
        )
        .await?;

    Ok(Json(customer))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

/// GET /api/customers/search?q=jo - autocomplete picker, at most 10 rows
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let q = validate_search_query(&query.q)?;
    let customers = state.db.customers().search(&q).await?;
    Ok(Json(customers))
}

/// GET /api/customers/by-number/{loyalty_number}
///
/// 404 is a meaningful outcome here: the register uses it to offer
/// inline enrollment pre-filled with the searched number.
async fn get_by_loyalty_number(
    State(state): State<AppState>,
    Path(loyalty_number): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state
        .db
        .customers()
        .get_by_loyalty_number(&loyalty_number)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &loyalty_number))?;

    Ok(Json(customer))
}

/// GET /api/customers/{id}/history
async fn purchase_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    // Distinguish "unknown customer" from "no purchases yet"
    state
        .db
        .customers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &id))?;

    let history = state.db.customers().purchase_history(&id).await?;
    Ok(Json(history))
}
