//! The role hierarchy and the login-time access group check.
//!
//! Access levels form a fixed total order, highest first:
//!
//! ```text
//! administrator > manager > analyst > viewer
//! ```
//!
//! At login a user picks the access group they want to work under. An account may always step
//! *down* into a lower group (an administrator can log in as a viewer) but never up. The decision
//! is made once, when the session is issued; the session row does not record the chosen group.
//!
//! Group identifiers arrive as free text from the login form. Anything that does not parse into an
//! [`AccessLevel`] is denied outright instead of being ranked as zero.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Account role / requested access group.
///
/// Variant order is the hierarchy order (lowest first), so the derived `Ord` is the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AccessLevel {
    Viewer,
    Analyst,
    Manager,
    Administrator,
}

impl AccessLevel {
    /// All levels, highest first.
    pub const ALL: [AccessLevel; 4] = [
        AccessLevel::Administrator,
        AccessLevel::Manager,
        AccessLevel::Analyst,
        AccessLevel::Viewer,
    ];

    /// Numeric rank; higher means more privilege.
    pub fn rank(self) -> u8 {
        match self {
            AccessLevel::Administrator => 4,
            AccessLevel::Manager => 3,
            AccessLevel::Analyst => 2,
            AccessLevel::Viewer => 1,
        }
    }

    /// Whether an account holding `self` may operate under `requested`.
    pub fn permits(self, requested: AccessLevel) -> bool {
        self.rank() >= requested.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Administrator => "administrator",
            AccessLevel::Manager => "manager",
            AccessLevel::Analyst => "analyst",
            AccessLevel::Viewer => "viewer",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known access level
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown access level '{0}'")]
pub struct UnknownAccessLevel(pub String);

impl FromStr for AccessLevel {
    type Err = UnknownAccessLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrator" => Ok(AccessLevel::Administrator),
            "manager" => Ok(AccessLevel::Manager),
            "analyst" => Ok(AccessLevel::Analyst),
            "viewer" => Ok(AccessLevel::Viewer),
            other => Err(UnknownAccessLevel(other.to_string())),
        }
    }
}

/// Outcome of the login-time group check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginDecision {
    Allowed,
    Denied,
}

impl LoginDecision {
    pub fn is_allowed(self) -> bool {
        self == LoginDecision::Allowed
    }
}

/// Decide whether an account with `account_role` may log in under the `requested_group` named by
/// the client. Unrecognised group names are always denied.
pub fn authorize_login(account_role: AccessLevel, requested_group: &str) -> LoginDecision {
    match requested_group.parse::<AccessLevel>() {
        Ok(requested) if account_role.permits(requested) => LoginDecision::Allowed,
        Ok(_) => LoginDecision::Denied,
        Err(e) => {
            tracing::debug!("Login requested an unranked access group: {}", e);
            LoginDecision::Denied
        }
    }
}
