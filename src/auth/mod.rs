//! Server-side admin check.
//!
//! The caller presents a user code; every privileged request resolves it
//! against the `users` collection. No client-held role flag is trusted.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::User;
use crate::AppState;

/// Header name for the access code.
pub const ACCESS_CODE_HEADER: &str = "x-access-code";

/// Extract the access code from the request headers.
///
/// `x-access-code` wins over `Authorization: Bearer <code>`.
pub fn access_code(headers: &HeaderMap) -> Option<String> {
    let direct = headers
        .get(ACCESS_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let bearer = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    direct.or_else(bearer).map(str::to_string)
}

/// Outcome of resolving an access code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// No code, or a code no user carries
    Anonymous,
    /// More than one user carries the code
    Ambiguous,
    /// Exactly one user carries the code
    User(User),
}

impl Access {
    pub fn is_admin(&self) -> bool {
        matches!(self, Access::User(user) if user.is_admin)
    }
}

/// Resolve an access code to at most one user.
pub async fn resolve_access(repo: &Repository, code: Option<&str>) -> Result<Access, AppError> {
    let Some(code) = code else {
        return Ok(Access::Anonymous);
    };

    let mut users = repo.find_users_by_code(code).await?;
    match users.len() {
        0 => Ok(Access::Anonymous),
        1 => Ok(users.pop().map(Access::User).unwrap_or(Access::Anonymous)),
        n => {
            tracing::warn!(matches = n, "Access code is shared by several users; refusing it");
            Ok(Access::Ambiguous)
        }
    }
}

/// Extractor for handlers that require an admin caller.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let code = access_code(&parts.headers);

        match resolve_access(&state.repo, code.as_deref()).await? {
            Access::User(user) if user.is_admin => Ok(AdminUser(user)),
            Access::User(user) => {
                tracing::warn!(user_id = %user.id, "Non-admin user attempted a privileged operation");
                Err(AppError::Forbidden("Admin privileges required".to_string()))
            }
            Access::Ambiguous => Err(AppError::Forbidden(
                "Access code does not identify a single user".to_string(),
            )),
            Access::Anonymous => Err(AppError::Unauthorized(
                "Missing or invalid access code".to_string(),
            )),
        }
    }
}
