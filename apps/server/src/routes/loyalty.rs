//! Loyalty API: the register-facing profile view and checkout-time
//! enrollment.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use meridian_core::{Customer, Transaction};

use crate::error::ApiError;
use crate::routes::customers::{enroll_customer, EnrollRequest};
use crate::state::AppState;

/// Recent transactions shown on the loyalty profile.
const RECENT_TRANSACTION_LIMIT: u32 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/loyalty/enroll", post(enroll))
        .route("/api/loyalty/{loyalty_number}", get(profile))
}

/// Full loyalty profile: the account plus its recent activity.
#[derive(Debug, Serialize)]
struct LoyaltyProfile {
    #[serde(flatten)]
    customer: Customer,
    recent_transactions: Vec<Transaction>,
}

/// GET /api/loyalty/{loyalty_number}
async fn profile(
    State(state): State<AppState>,
    Path(loyalty_number): Path<String>,
) -> Result<Json<LoyaltyProfile>, ApiError> {
    let customer = state
        .db
        .customers()
        .get_by_loyalty_number(&loyalty_number)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &loyalty_number))?;

    let recent_transactions = state
        .db
        .customers()
        .recent_transactions(&customer.id, RECENT_TRANSACTION_LIMIT)
        .await?;

    Ok(Json(LoyaltyProfile {
        customer,
        recent_transactions,
    }))
}

/// POST /api/loyalty/enroll - inline enrollment during checkout, after
/// an exact lookup came back not-found.
async fn enroll(
    State(state): State<AppState>,
    Json(request): Json<EnrollRequest>,
) -> Result<Json<Customer>, ApiError> {
    let customer = enroll_customer(&state, request).await?;
    Ok(Json(customer))
}
