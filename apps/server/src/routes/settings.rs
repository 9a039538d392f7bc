//! Per-user settings API, keyed by the client-generated opaque id the
//! browser persists in local storage. This is intentionally weak
//! identity, preserved as designed; writes are last-write-wins.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use meridian_core::{Theme, UserSettings};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings/{user_id}", get(get_settings).put(put_settings))
}

/// GET /api/settings/{user_id}
///
/// Unknown ids get the defaults without persisting anything; the
/// client saves on its first change.
async fn get_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserSettings>, ApiError> {
    let settings = state.db.settings().get_user_settings(&user_id).await?;

    let settings = settings.unwrap_or(UserSettings {
        user_id,
        theme: Theme::default(),
        location_id: None,
        updated_at: Utc::now(),
    });

    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
struct PutSettingsRequest {
    theme: Theme,
    location_id: Option<String>,
}

/// PUT /api/settings/{user_id} - upsert, last write wins
async fn put_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<PutSettingsRequest>,
) -> Result<Json<UserSettings>, ApiError> {
    // A selected location must exist; theme needs no further checks.
    if let Some(location_id) = &request.location_id {
        state
            .db
            .locations()
            .get_by_id(location_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Location", location_id))?;
    }

    let settings = state
        .db
        .settings()
        .put_user_settings(&user_id, request.theme, request.location_id.as_deref())
        .await?;

    Ok(Json(settings))
}
