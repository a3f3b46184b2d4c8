//! User model for the `users` collection.

use serde::{Deserialize, Serialize};

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// Lookup key, also used as the login token.
    pub code: String,
    pub is_admin: bool,
    pub is_moderator: bool,
    pub is_demo: bool,
    /// Display label, e.g. "Admin" or "Student".
    pub role: String,
}

/// User document body as written to the store (the id lives outside it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_moderator: bool,
    #[serde(default)]
    pub is_demo: bool,
    pub role: String,
}

impl NewUser {
    pub fn with_id(self, id: impl Into<String>) -> User {
        User {
            id: id.into(),
            name: self.name,
            code: self.code,
            is_admin: self.is_admin,
            is_moderator: self.is_moderator,
            is_demo: self.is_demo,
            role: self.role,
        }
    }
}

/// The accounts written when the `users` collection is first seen empty.
pub fn default_users() -> Vec<NewUser> {
    let user = |name: &str, code: &str, role: &str| NewUser {
        name: name.to_string(),
        code: code.to_string(),
        is_admin: false,
        is_moderator: false,
        is_demo: false,
        role: role.to_string(),
    };

    vec![
        NewUser {
            is_admin: true,
            ..user("Admin User", "admin123", "Admin")
        },
        NewUser {
            is_moderator: true,
            ..user("Moderator User", "mod123", "Moderator")
        },
        user("Test User", "user123", "Student"),
        NewUser {
            is_demo: true,
            ..user("Demo User", "demo123", "Student")
        },
    ]
}

/// Request body for looking a user up by code.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub code: String,
}
