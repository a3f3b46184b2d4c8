//! User, access and seeding API endpoints.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use serde_json::Value;

use super::{success, ApiResult};
use crate::auth::{access_code, resolve_access};
use crate::errors::AppError;
use crate::models::{LoginRequest, User};
use crate::AppState;

/// Result of the admin check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub is_admin: bool,
}

/// Which collections were seeded by this call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeReport {
    pub users_seeded: bool,
    pub settings_seeded: bool,
}

/// POST /api/login - Look a user up by access code.
pub async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<User> {
    let request: LoginRequest =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;

    let code = request.code.trim();
    if code.is_empty() {
        return Err(AppError::Validation("Code is required".to_string()));
    }

    match state.repo.get_user_by_code(code).await? {
        Some(user) => success(user),
        None => Err(AppError::NotFound("No user with this code".to_string())),
    }
}

/// GET /api/check-admin - Whether the presented access code belongs to an admin.
pub async fn check_admin(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<AdminStatus> {
    let code = access_code(&headers);
    let access = resolve_access(&state.repo, code.as_deref()).await?;

    success(AdminStatus {
        is_admin: access.is_admin(),
    })
}

/// POST /api/initialize - Seed default users and settings if absent.
pub async fn initialize(State(state): State<AppState>) -> ApiResult<InitializeReport> {
    let users_seeded = state.repo.initialize_users().await?;
    let settings_seeded = state.repo.initialize_settings().await?;

    success(InitializeReport {
        users_seeded,
        settings_seeded,
    })
}
