//! API models for login and logout.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::roles::AccessLevel;

/// Login form body (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Missing fields are treated as empty and fail verification like any wrong value
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Access group to log in under. Older forms submit this as `role`. A missing or
    /// unrecognised value is denied.
    #[serde(default, alias = "role")]
    pub group: String,
}

/// What the login page needs to render.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginInfo {
    /// Selectable access groups, highest first
    pub groups: Vec<AccessLevel>,
    pub message: String,
}

impl Default for LoginInfo {
    fn default() -> Self {
        Self {
            groups: AccessLevel::ALL.to_vec(),
            message: "Sign in and choose the access group to work under".to_string(),
        }
    }
}
