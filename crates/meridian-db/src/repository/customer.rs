//! # Customer Repository
//!
//! Database operations for loyalty accounts: enrollment, exact and
//! fuzzy lookup, and purchase history.
//!
//! ## Lookup Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Exact:  loyalty number, uppercase-normalized                          │
//! │          → Some(customer) | None  (None drives inline enrollment)      │
//! │                                                                         │
//! │  Fuzzy:  case-insensitive substring over name, email, number           │
//! │          → at most 10 rows, ordered by name (autocomplete picker)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use meridian_core::loyalty::normalize_loyalty_number;
use meridian_core::{Customer, LoyaltyTier, MembershipStatus, Transaction, CUSTOMER_SEARCH_LIMIT};

/// Enrollment input. The loyalty number is optional: when absent the
/// repository generates an unused one.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub loyalty_number: Option<String>,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists all customers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Gets a customer by internal id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Exact lookup by loyalty number.
    ///
    /// Input is normalized to uppercase first, so `abc123` finds
    /// `ABC123`. `Ok(None)` is the distinct "not found" outcome the
    /// POS uses to offer inline enrollment.
    pub async fn get_by_loyalty_number(&self, number: &str) -> DbResult<Option<Customer>> {
        let number = normalize_loyalty_number(number);

        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE loyalty_number = ?1")
                .bind(&number)
                .fetch_optional(&self.pool)
                .await?;

        Ok(customer)
    }

    /// Fuzzy search over name, email, and loyalty number.
    ///
    /// Case-insensitive substring match, at most
    /// [`CUSTOMER_SEARCH_LIMIT`] rows, ordered by name.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());

        debug!(query = %query, "Searching customers");

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE name LIKE ?1 COLLATE NOCASE
               OR email LIKE ?1 COLLATE NOCASE
               OR loyalty_number LIKE ?1 COLLATE NOCASE
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(CUSTOMER_SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Enrolls a new customer.
    ///
    /// ## Loyalty Number Assignment
    /// - Caller-supplied: format is validated by the API layer before
    ///   this call; rejected here with a conflict if already enrolled
    /// - Absent: a random unused number is generated
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - supplied number already enrolled
    pub async fn enroll(&self, new: &NewCustomer) -> DbResult<Customer> {
        let loyalty_number = match &new.loyalty_number {
            Some(number) => {
                let number = normalize_loyalty_number(number);
                if self.get_by_loyalty_number(&number).await?.is_some() {
                    return Err(DbError::duplicate("loyalty_number", &number));
                }
                number
            }
            None => self.generate_loyalty_number().await?,
        };

        debug!(loyalty_number = %loyalty_number, "Enrolling customer");

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            loyalty_number,
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            points_balance: 0,
            lifetime_spend_cents: 0,
            visit_count: 0,
            last_visit_at: None,
            status: MembershipStatus::Active,
            tier: LoyaltyTier::Bronze,
            tier_override: false,
            enrolled_at: now,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, loyalty_number, name, email, phone,
                points_balance, lifetime_spend_cents, visit_count, last_visit_at,
                status, tier, tier_override, enrolled_at, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14, ?15
            )
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.loyalty_number)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.points_balance)
        .bind(customer.lifetime_spend_cents)
        .bind(customer.visit_count)
        .bind(customer.last_visit_at)
        .bind(customer.status)
        .bind(customer.tier)
        .bind(customer.tier_override)
        .bind(customer.enrolled_at)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Updates a customer's editable profile fields.
    ///
    /// The loyalty number is immutable and deliberately not part of
    /// this statement.
    pub async fn update_profile(
        &self,
        id: &str,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        status: MembershipStatus,
        tier: Option<LoyaltyTier>,
    ) -> DbResult<Customer> {
        let now = Utc::now();

        // A supplied tier is a manual override; None re-enables
        // automatic recalculation on the next accrual.
        let (tier_value, tier_override) = match tier {
            Some(t) => (Some(t), true),
            None => (None, false),
        };

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                email = ?3,
                phone = ?4,
                status = ?5,
                tier = COALESCE(?6, tier),
                tier_override = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(status)
        .bind(tier_value)
        .bind(tier_override)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Purchase history for a customer, newest first.
    pub async fn purchase_history(&self, customer_id: &str) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE customer_id = ?1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Recent transactions for the loyalty profile view.
    pub async fn recent_transactions(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE customer_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Generates a random unused AAA999 loyalty number.
    ///
    /// Collision probability is tiny (26³·10³ combinations), so a
    /// bounded retry loop is plenty.
    async fn generate_loyalty_number(&self) -> DbResult<String> {
        for _ in 0..16 {
            let candidate = random_loyalty_number();
            if self.get_by_loyalty_number(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(DbError::Internal(
            "could not generate an unused loyalty number".to_string(),
        ))
    }

    /// Counts customers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Builds a random loyalty number: 3 uppercase letters + 3 digits.
fn random_loyalty_number() -> String {
    let mut rng = rand::thread_rng();
    let letters: String = (0..3)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect();
    let digits: String = (0..3)
        .map(|_| rng.gen_range(b'0'..=b'9') as char)
        .collect();
    format!("{letters}{digits}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::loyalty::validate_loyalty_number;

    #[test]
    fn test_random_loyalty_number_is_well_formed() {
        for _ in 0..100 {
            let number = random_loyalty_number();
            assert!(validate_loyalty_number(&number).is_ok(), "{number}");
        }
    }
}
