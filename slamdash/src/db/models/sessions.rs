//! Database models for sessions.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{SessionToken, UserId};

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    /// The bearer token itself; primary key
    pub id: SessionToken,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is usable only while `now` is strictly before `expires_at`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Request for creating a session
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub token: SessionToken,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Response type (same as entity for now)
pub type SessionDBResponse = Session;
