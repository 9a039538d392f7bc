//! Transaction API: the list view and the atomic checkout.
//!
//! The handler does everything that must happen *before* any write:
//! resolve the location and its tax rate, snapshot cart lines from the
//! catalog, run the pure pricing math, verify the tender and any
//! points redemption. Only then does the repository's single SQL
//! transaction run.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use meridian_core::pricing::{change_due, compute_totals};
use meridian_core::validation::{validate_points, validate_quantity};
use meridian_core::{CartLine, CoreError, Discount, Money, PaymentMethod, TransactionDetail};
use meridian_db::NewTransaction;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: u32 = 50;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/transactions", get(list).post(create))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u32>,
}

/// GET /api/transactions - newest first, with customer display fields
/// and line items for the receipt list
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TransactionDetail>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(500);
    let transactions = state.db.transactions().list(limit).await?;
    Ok(Json(transactions))
}

#[derive(Debug, Deserialize)]
struct CheckoutItem {
    product_id: String,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    location_id: String,
    /// Absent for walk-in sales.
    customer_id: Option<String>,
    items: Vec<CheckoutItem>,
    payment_method: PaymentMethod,
    /// Required for cash; ignored for card/mobile.
    amount_received_cents: Option<i64>,
    discount: Option<Discount>,
    points_redeemed: Option<i64>,
}

/// POST /api/transactions - the checkout workflow
async fn create(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<TransactionDetail>, ApiError> {
    // 1. Resolve the location; its tax rate drives the math.
    let location = state
        .db
        .locations()
        .get_by_id(&request.location_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Location", &request.location_id))?;

    if request.items.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    // 2. Snapshot cart lines from the current catalog records.
    let mut lines = Vec::with_capacity(request.items.len());
    for item in &request.items {
        validate_quantity(item.quantity)?;

        let product = state
            .db
            .products()
            .get_by_id(&item.product_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", &item.product_id))?;

        lines.push(CartLine {
            product_id: product.id,
            name: product.name,
            unit_price_cents: product.price_cents,
            quantity: item.quantity,
        });
    }

    // 3. Pure pricing math: subtotal → discount → tax → total → points.
    let totals = compute_totals(&lines, request.discount, location.tax_rate())?;
    let total = Money::from_cents(totals.total_cents);

    // 4. Verify points redemption against the customer's balance.
    let points_redeemed = request.points_redeemed.unwrap_or(0);
    validate_points(points_redeemed)?;
    if let Some(customer_id) = &request.customer_id {
        let customer = state
            .db
            .customers()
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Customer", customer_id))?;

        if points_redeemed > customer.points_balance {
            return Err(CoreError::InvalidRedemption {
                reason: format!(
                    "cannot redeem {points_redeemed} points, balance is {}",
                    customer.points_balance
                ),
            }
            .into());
        }
    } else if points_redeemed > 0 {
        return Err(CoreError::InvalidRedemption {
            reason: "points cannot be redeemed on a walk-in sale".to_string(),
        }
        .into());
    }

    // 5. Verify the tender. Cash must cover the total before anything
    //    is written; other tenders settle exactly.
    let (amount_received_cents, change_cents) = match request.payment_method {
        PaymentMethod::Cash => {
            let received = request
                .amount_received_cents
                .ok_or_else(|| ApiError::validation("amount_received_cents is required for cash"))?;
            let change = change_due(total, Money::from_cents(received))?;
            (received, change.cents())
        }
        PaymentMethod::Card | PaymentMethod::Mobile => (totals.total_cents, 0),
    };

    // 6. One atomic commit: header, items, stock, loyalty accrual.
    let detail = state
        .db
        .transactions()
        .create(NewTransaction {
            customer_id: request.customer_id,
            location_id: location.id,
            totals,
            discount_type: request.discount.map(|d| d.kind),
            discount_value: request.discount.map(|d| d.value),
            payment_method: request.payment_method,
            amount_received_cents,
            change_cents,
            points_redeemed,
            lines,
        })
        .await?;

    Ok(Json(detail))
}
