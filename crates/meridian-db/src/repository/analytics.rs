//! # Analytics Repository
//!
//! Read-only aggregation for the sales dashboard. Every snapshot is
//! computed fresh from the base tables on each request - there is no
//! caching layer to invalidate.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// How far back a customer's last visit may be to count as "active".
const ACTIVE_CUSTOMER_WINDOW_DAYS: i64 = 30;

/// The dashboard aggregate, global or scoped to one location.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_revenue_cents: i64,
    pub today_revenue_cents: i64,
    pub transaction_count: i64,
    pub low_stock_count: i64,
    pub customer_count: i64,
    /// Customers who visited within the trailing 30 days.
    pub active_customer_count: i64,
}

/// Repository for dashboard aggregation queries.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: SqlitePool,
}

impl AnalyticsRepository {
    /// Creates a new AnalyticsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AnalyticsRepository { pool }
    }

    /// Computes the dashboard snapshot.
    ///
    /// Revenue and transaction counts respect the optional location
    /// scope; catalog and customer counts are chain-wide.
    pub async fn snapshot(
        &self,
        location_id: Option<&str>,
        low_stock_threshold: i64,
    ) -> DbResult<AnalyticsSnapshot> {
        debug!(?location_id, "Computing analytics snapshot");

        let now = Utc::now();
        let start_of_day = start_of_day_utc(now);
        let active_cutoff = now - Duration::days(ACTIVE_CUSTOMER_WINDOW_DAYS);

        let (total_revenue_cents, transaction_count) = self.revenue_since(location_id, None).await?;
        let (today_revenue_cents, _) = self.revenue_since(location_id, Some(start_of_day)).await?;

        let low_stock_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE is_active = 1 AND stock_quantity <= ?1",
        )
        .bind(low_stock_threshold)
        .fetch_one(&self.pool)
        .await?;

        let customer_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        let active_customer_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customers WHERE last_visit_at IS NOT NULL AND last_visit_at >= ?1",
        )
        .bind(active_cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(AnalyticsSnapshot {
            total_revenue_cents,
            today_revenue_cents,
            transaction_count,
            low_stock_count,
            customer_count,
            active_customer_count,
        })
    }

    /// Sums revenue and counts transactions, optionally scoped by
    /// location and/or a lower time bound.
    async fn revenue_since(
        &self,
        location_id: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<(i64, i64)> {
        let row: (Option<i64>, i64) = match (location_id, since) {
            (Some(location), Some(since)) => {
                sqlx::query_as(
                    "SELECT SUM(total_cents), COUNT(*) FROM transactions \
                     WHERE location_id = ?1 AND created_at >= ?2",
                )
                .bind(location)
                .bind(since)
                .fetch_one(&self.pool)
                .await?
            }
            (Some(location), None) => {
                sqlx::query_as(
                    "SELECT SUM(total_cents), COUNT(*) FROM transactions WHERE location_id = ?1",
                )
                .bind(location)
                .fetch_one(&self.pool)
                .await?
            }
            (None, Some(since)) => {
                sqlx::query_as(
                    "SELECT SUM(total_cents), COUNT(*) FROM transactions WHERE created_at >= ?1",
                )
                .bind(since)
                .fetch_one(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query_as("SELECT SUM(total_cents), COUNT(*) FROM transactions")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok((row.0.unwrap_or(0), row.1))
    }
}

/// Truncates a timestamp to midnight UTC.
fn start_of_day_utc(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_day() {
        let now = "2026-08-06T15:42:10Z".parse::<DateTime<Utc>>().unwrap();
        let midnight = start_of_day_utc(now);
        assert_eq!(midnight.to_rfc3339(), "2026-08-06T00:00:00+00:00");
    }
}
