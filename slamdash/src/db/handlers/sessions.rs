//! Database repository for sessions.
//!
//! Every method here is a single SQL statement, so each one is atomic on its own. Validity is not
//! decided in SQL: callers fetch the row and compare `expires_at` against their own clock, which
//! keeps expired-but-present rows observable to tests and to the sweeper.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::sessions::{Session, SessionCreateDBRequest, SessionDBResponse},
    },
    types::{SessionToken, UserId, abbrev_token},
};

pub struct Sessions<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Sessions<'c> {
    type CreateRequest = SessionCreateDBRequest;
    type Response = SessionDBResponse;
    type Id = SessionToken;

    #[instrument(skip(self, request), fields(token = %abbrev_token(&request.token), user_id = request.user_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, created_at, expires_at
            "#,
        )
        .bind(&request.token)
        .bind(request.user_id)
        .bind(request.created_at)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session)
    }

    #[instrument(skip(self, id), fields(token = %abbrev_token(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        self.get(&id).await
    }
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Borrowing variant of [`Repository::get_by_id`]
    #[instrument(skip(self, token), fields(token = %abbrev_token(token)), err)]
    pub async fn get(&mut self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?")
            .bind(token)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(session)
    }

    /// Delete a session. Returns whether a row was removed.
    #[instrument(skip(self, token), fields(token = %abbrev_token(token)), err)]
    pub async fn delete(&mut self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(token)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every session whose expiry is at or before `now`. Rows still inside their window are
    /// never touched.
    #[instrument(skip(self), err)]
    pub async fn delete_expired(&mut self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(user_id = user_id), err)]
    pub async fn count_for_user(&mut self, user_id: UserId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
