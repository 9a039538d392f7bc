//! System settings API: admin-managed key/value configuration plus
//! the database connection info panel.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use meridian_core::{SettingType, SystemSetting};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/system-settings", get(list).post(create))
        .route("/api/system-settings/connection-info", get(connection_info))
        .route(
            "/api/system-settings/{key}",
            axum::routing::put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    category: Option<String>,
}

/// GET /api/system-settings?category=loyalty
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SystemSetting>>, ApiError> {
    let settings = state
        .db
        .settings()
        .list_system_settings(query.category.as_deref())
        .await?;
    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
struct CreateSettingRequest {
    key: String,
    value: String,
    category: Option<String>,
    value_type: SettingType,
    description: Option<String>,
}

/// POST /api/system-settings
async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateSettingRequest>,
) -> Result<Json<SystemSetting>, ApiError> {
    let key = request.key.trim();
    if key.is_empty() {
        return Err(ApiError::validation("key is required"));
    }

    let setting = state
        .db
        .settings()
        .create_system_setting(
            key,
            &request.value,
            request.category.as_deref(),
            request.value_type,
            request.description.as_deref(),
        )
        .await?;

    Ok(Json(setting))
}

#[derive(Debug, Deserialize)]
struct UpdateSettingRequest {
    value: String,
    description: Option<String>,
}

/// PUT /api/system-settings/{key}
async fn update(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<UpdateSettingRequest>,
) -> Result<Json<SystemSetting>, ApiError> {
    let setting = state
        .db
        .settings()
        .update_system_setting(&key, &request.value, request.description.as_deref())
        .await?;

    Ok(Json(setting))
}

/// DELETE /api/system-settings/{key}
async fn delete(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.settings().delete_system_setting(&key).await?;
    Ok(Json(serde_json::json!({ "deleted": key })))
}

/// Facts shown on the admin "database" panel.
#[derive(Debug, Serialize)]
struct ConnectionInfo {
    backend: &'static str,
    database_path: String,
    pool_size: u32,
    idle_connections: usize,
    healthy: bool,
}

/// GET /api/system-settings/connection-info
async fn connection_info(State(state): State<AppState>) -> Json<ConnectionInfo> {
    let pool = state.db.pool();
    Json(ConnectionInfo {
        backend: "sqlite",
        database_path: state.config.database_path.clone(),
        pool_size: pool.size(),
        idle_connections: pool.num_idle(),
        healthy: state.db.health_check().await,
    })
}
