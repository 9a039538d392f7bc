//! # Location Repository
//!
//! Database operations for retail locations. Store codes are validated
//! by the API layer before they reach these statements; the UNIQUE
//! constraint backs them up.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use meridian_core::Location;

/// Editable location fields (everything except id and store_code -
/// the store code is immutable after creation).
#[derive(Debug, Clone)]
pub struct LocationUpdate {
    pub name: String,
    pub brand: Option<String>,
    pub address: Option<String>,
    pub manager: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_rate_bps: Option<u32>,
}

/// Repository for location database operations.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    /// Creates a new LocationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Lists all locations ordered by store code.
    pub async fn list(&self) -> DbResult<Vec<Location>> {
        let locations =
            sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY store_code")
                .fetch_all(&self.pool)
                .await?;

        Ok(locations)
    }

    /// Gets a location by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(location)
    }

    /// Inserts a new location.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - store code already in use
    pub async fn insert(&self, location: &Location) -> DbResult<()> {
        debug!(store_code = %location.store_code, "Inserting location");

        sqlx::query(
            r#"
            INSERT INTO locations (
                id, store_code, name, brand, address, manager,
                logo_url, phone, email, tax_rate_bps, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&location.id)
        .bind(&location.store_code)
        .bind(&location.name)
        .bind(&location.brand)
        .bind(&location.address)
        .bind(&location.manager)
        .bind(&location.logo_url)
        .bind(&location.phone)
        .bind(&location.email)
        .bind(location.tax_rate_bps)
        .bind(location.created_at)
        .bind(location.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a location's editable fields.
    pub async fn update(&self, id: &str, update: &LocationUpdate) -> DbResult<Location> {
        debug!(id = %id, "Updating location");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE locations SET
                name = ?2, brand = ?3, address = ?4, manager = ?5,
                phone = ?6, email = ?7, tax_rate_bps = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.brand)
        .bind(&update.address)
        .bind(&update.manager)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(update.tax_rate_bps)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Location", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Location", id))
    }

    /// Updates just the logo URL.
    pub async fn update_logo(&self, id: &str, logo_url: Option<&str>) -> DbResult<Location> {
        debug!(id = %id, "Updating location logo");

        let now = Utc::now();

        let result = sqlx::query("UPDATE locations SET logo_url = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(logo_url)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Location", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Location", id))
    }
}

/// Helper to generate a new location ID.
pub fn generate_location_id() -> String {
    Uuid::new_v4().to_string()
}
