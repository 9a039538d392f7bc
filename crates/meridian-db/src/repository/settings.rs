//! # Settings Repository
//!
//! Per-user preferences and admin-managed system settings.
//!
//! User settings are keyed by a client-generated opaque id and follow
//! last-write-wins semantics: the upsert below has no optimistic lock,
//! matching how the web client uses the endpoint.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use meridian_core::{SettingType, SystemSetting, Theme, UserSettings};

/// Repository for user and system settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    // =========================================================================
    // User settings
    // =========================================================================

    /// Gets one user's settings.
    pub async fn get_user_settings(&self, user_id: &str) -> DbResult<Option<UserSettings>> {
        let settings =
            sqlx::query_as::<_, UserSettings>("SELECT * FROM user_settings WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(settings)
    }

    /// Upserts one user's settings (last write wins).
    pub async fn put_user_settings(
        &self,
        user_id: &str,
        theme: Theme,
        location_id: Option<&str>,
    ) -> DbResult<UserSettings> {
        debug!(user_id = %user_id, "Saving user settings");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, theme, location_id, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                theme = excluded.theme,
                location_id = excluded.location_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(theme)
        .bind(location_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(UserSettings {
            user_id: user_id.to_string(),
            theme,
            location_id: location_id.map(String::from),
            updated_at: now,
        })
    }

    // =========================================================================
    // System settings
    // =========================================================================

    /// Lists system settings, optionally filtered by category.
    pub async fn list_system_settings(
        &self,
        category: Option<&str>,
    ) -> DbResult<Vec<SystemSetting>> {
        let settings = match category {
            Some(category) => {
                sqlx::query_as::<_, SystemSetting>(
                    "SELECT * FROM system_settings WHERE category = ?1 ORDER BY key",
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SystemSetting>("SELECT * FROM system_settings ORDER BY key")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(settings)
    }

    /// Gets one system setting by key.
    pub async fn get_system_setting(&self, key: &str) -> DbResult<Option<SystemSetting>> {
        let setting =
            sqlx::query_as::<_, SystemSetting>("SELECT * FROM system_settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(setting)
    }

    /// Creates a system setting.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - key already exists
    pub async fn create_system_setting(
        &self,
        key: &str,
        value: &str,
        category: Option<&str>,
        value_type: SettingType,
        description: Option<&str>,
    ) -> DbResult<SystemSetting> {
        debug!(key = %key, "Creating system setting");

        let now = Utc::now();
        let setting = SystemSetting {
            id: Uuid::new_v4().to_string(),
            key: key.to_string(),
            value: value.to_string(),
            category: category.map(String::from),
            value_type,
            description: description.map(String::from),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO system_settings
                (id, key, value, category, value_type, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&setting.id)
        .bind(&setting.key)
        .bind(&setting.value)
        .bind(&setting.category)
        .bind(setting.value_type)
        .bind(&setting.description)
        .bind(setting.created_at)
        .bind(setting.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(setting)
    }

    /// Updates a system setting's value and description.
    pub async fn update_system_setting(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> DbResult<SystemSetting> {
        debug!(key = %key, "Updating system setting");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE system_settings SET
                value = ?2,
                description = COALESCE(?3, description),
                updated_at = ?4
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Setting", key));
        }

        self.get_system_setting(key)
            .await?
            .ok_or_else(|| DbError::not_found("Setting", key))
    }

    /// Deletes a system setting.
    pub async fn delete_system_setting(&self, key: &str) -> DbResult<()> {
        debug!(key = %key, "Deleting system setting");

        let result = sqlx::query("DELETE FROM system_settings WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Setting", key));
        }

        Ok(())
    }
}
