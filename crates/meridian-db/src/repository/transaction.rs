//! # Transaction Repository
//!
//! The checkout commit block and read paths for committed sales.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Atomic Checkout (one SQL transaction)                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. INSERT transaction header (totals, payment, points)              │
//! │    2. Per cart line:                                                    │
//! │         INSERT transaction_items snapshot row                          │
//! │         UPDATE products SET stock_quantity = stock_quantity - qty      │
//! │    3. If a customer is linked:                                          │
//! │         points_balance  += earned - redeemed                           │
//! │         lifetime_spend  += total                                       │
//! │         visit_count     += 1, last_visit_at = now                      │
//! │         tier recalculated unless manually pinned                       │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls the whole block back: no partial transaction,       │
//! │  no partial stock decrement, no partial accrual.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock decrement deliberately has no lower-bound check. Two
//! concurrent checkouts of the same product serialize only as far as
//! SQLite's own write transaction does, and stock can go negative.
//! Oversell is reconciled by inventory admin, not prevented here.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use meridian_core::loyalty::tier_for_spend;
use meridian_core::{
    CartLine, CheckoutTotals, DiscountType, Money, PaymentMethod, Transaction, TransactionDetail,
    TransactionItem,
};

/// Everything the checkout workflow computed, ready to persist.
///
/// Totals arrive pre-computed from `meridian_core::pricing`; this
/// repository only persists, it never re-derives money.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub customer_id: Option<String>,
    pub location_id: String,
    pub totals: CheckoutTotals,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub payment_method: PaymentMethod,
    pub amount_received_cents: i64,
    pub change_cents: i64,
    pub points_redeemed: i64,
    pub lines: Vec<CartLine>,
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Commits a checkout atomically and returns the receipt shape.
    ///
    /// ## Ordering Guarantee
    /// The header row exists before any line item references it
    /// (required for referential integrity). No ordering is guaranteed
    /// across separate checkout calls.
    ///
    /// ## Errors
    /// Any failure inside the block (unknown product id, constraint
    /// violation, engine error) rolls back every write.
    pub async fn create(&self, new: NewTransaction) -> DbResult<TransactionDetail> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(
            transaction_id = %id,
            total_cents = new.totals.total_cents,
            lines = new.lines.len(),
            "Committing checkout"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, customer_id, location_id,
                subtotal_cents, discount_type, discount_value, discount_cents,
                tax_cents, total_cents, payment_method,
                amount_received_cents, change_cents,
                points_earned, points_redeemed, created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12,
                ?13, ?14, ?15
            )
            "#,
        )
        .bind(&id)
        .bind(&new.customer_id)
        .bind(&new.location_id)
        .bind(new.totals.subtotal_cents)
        .bind(new.discount_type)
        .bind(new.discount_value)
        .bind(new.totals.discount_cents)
        .bind(new.totals.tax_cents)
        .bind(new.totals.total_cents)
        .bind(new.payment_method)
        .bind(new.amount_received_cents)
        .bind(new.change_cents)
        .bind(new.totals.points_earned)
        .bind(new.points_redeemed)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            let item = TransactionItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: id.clone(),
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line.line_total().cents(),
            };

            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    id, transaction_id, product_id, name,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .execute(&mut *tx)
            .await?;

            // Unconditional decrement: no floor check, repeated sales
            // decrement repeatedly (see module docs on oversell).
            let result = sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity - ?2, updated_at = ?3 \
                 WHERE id = ?1",
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Product", &line.product_id));
            }

            items.push(item);
        }

        let mut customer_name = None;
        let mut loyalty_number = None;

        if let Some(customer_id) = &new.customer_id {
            let row = sqlx::query_as::<_, (String, String, i64, bool)>(
                "SELECT name, loyalty_number, lifetime_spend_cents, tier_override \
                 FROM customers WHERE id = ?1",
            )
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

            let (name, number, lifetime_spend_cents, tier_override) = row;

            let new_spend = lifetime_spend_cents + new.totals.total_cents;
            let points_delta = new.totals.points_earned - new.points_redeemed;

            if tier_override {
                sqlx::query(
                    r#"
                    UPDATE customers SET
                        points_balance = points_balance + ?2,
                        lifetime_spend_cents = ?3,
                        visit_count = visit_count + 1,
                        last_visit_at = ?4,
                        updated_at = ?4
                    WHERE id = ?1
                    "#,
                )
                .bind(customer_id)
                .bind(points_delta)
                .bind(new_spend)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            } else {
                let tier = tier_for_spend(Money::from_cents(new_spend));
                sqlx::query(
                    r#"
                    UPDATE customers SET
                        points_balance = points_balance + ?2,
                        lifetime_spend_cents = ?3,
                        visit_count = visit_count + 1,
                        last_visit_at = ?4,
                        tier = ?5,
                        updated_at = ?4
                    WHERE id = ?1
                    "#,
                )
                .bind(customer_id)
                .bind(points_delta)
                .bind(new_spend)
                .bind(now)
                .bind(tier)
                .execute(&mut *tx)
                .await?;
            }

            customer_name = Some(name);
            loyalty_number = Some(number);
        }

        tx.commit().await?;

        info!(
            transaction_id = %id,
            total = %Money::from_cents(new.totals.total_cents),
            points = new.totals.points_earned,
            "Checkout committed"
        );

        let transaction = Transaction {
            id,
            customer_id: new.customer_id,
            location_id: new.location_id,
            subtotal_cents: new.totals.subtotal_cents,
            discount_type: new.discount_type,
            discount_value: new.discount_value,
            discount_cents: new.totals.discount_cents,
            tax_cents: new.totals.tax_cents,
            total_cents: new.totals.total_cents,
            payment_method: new.payment_method,
            amount_received_cents: new.amount_received_cents,
            change_cents: new.change_cents,
            points_earned: new.totals.points_earned,
            points_redeemed: new.points_redeemed,
            created_at: now,
        };

        Ok(TransactionDetail {
            transaction,
            customer_name,
            loyalty_number,
            items,
        })
    }

    /// Lists transactions newest-first, joined with customer display
    /// fields and line items.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<TransactionDetail>> {
        let rows = sqlx::query_as::<_, JoinedTransaction>(
            r#"
            SELECT t.*, c.name AS customer_name, c.loyalty_number AS loyalty_number
            FROM transactions t
            LEFT JOIN customers c ON c.id = t.customer_id
            ORDER BY t.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(&row.transaction.id).await?;
            details.push(TransactionDetail {
                transaction: row.transaction,
                customer_name: row.customer_name,
                loyalty_number: row.loyalty_number,
                items,
            });
        }

        Ok(details)
    }

    /// Gets one transaction with customer fields and items.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<TransactionDetail>> {
        let row = sqlx::query_as::<_, JoinedTransaction>(
            r#"
            SELECT t.*, c.name AS customer_name, c.loyalty_number AS loyalty_number
            FROM transactions t
            LEFT JOIN customers c ON c.id = t.customer_id
            WHERE t.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.items_for(&row.transaction.id).await?;
        Ok(Some(TransactionDetail {
            transaction: row.transaction,
            customer_name: row.customer_name,
            loyalty_number: row.loyalty_number,
            items,
        }))
    }

    /// Line items for one transaction, in insertion order.
    async fn items_for(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let items = sqlx::query_as::<_, TransactionItem>(
            "SELECT * FROM transaction_items WHERE transaction_id = ?1 ORDER BY rowid",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts committed transactions (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Read-model row: a transaction plus the joined customer fields.
#[derive(Debug, sqlx::FromRow)]
struct JoinedTransaction {
    #[sqlx(flatten)]
    transaction: Transaction,
    customer_name: Option<String>,
    loyalty_number: Option<String>,
}
