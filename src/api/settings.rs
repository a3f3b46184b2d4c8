//! System settings API endpoints.

use axum::{extract::State, Json};
use serde_json::Value;

use super::{success, ApiResult};
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::{DocumentPatch, SystemSettings};
use crate::AppState;

/// GET /api/settings - Get the system settings.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<SystemSettings> {
    match state.repo.get_system_settings().await? {
        Some(settings) => success(settings),
        None => Err(AppError::NotFound(
            "System settings are not configured".to_string(),
        )),
    }
}

/// PATCH /api/settings - Merge fields into the system settings.
pub async fn update_settings(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<SystemSettings> {
    let patch: DocumentPatch =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
    if patch.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    tracing::debug!(admin = %admin.name, "Updating system settings");
    success(state.repo.update_system_settings(&patch).await?)
}
