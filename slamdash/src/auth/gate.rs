//! The access gate in front of every protected operation.
//!
//! A request is let through only if it presents a token that the [`SessionManager`] resolves to a
//! user. Missing, unknown and expired tokens all collapse into the same
//! [`Error::Unauthenticated`], which renders as a redirect to the login page.

use sqlx::SqlitePool;
use tracing::{debug, instrument};

use crate::{
    api::models::users::CurrentUser,
    auth::{
        roles::{self, AccessLevel, LoginDecision},
        session::SessionManager,
    },
    db::handlers::{Repository, Users},
    errors::Error,
    types::UserId,
};

#[derive(Clone)]
pub struct AccessGate {
    db: SqlitePool,
    sessions: SessionManager,
}

impl AccessGate {
    pub fn new(db: SqlitePool, sessions: SessionManager) -> Self {
        Self { db, sessions }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Resolve the presented token to its owner.
    #[instrument(skip_all, err(level = "debug"))]
    pub async fn authenticate(&self, presented: Option<&str>) -> Result<UserId, Error> {
        let Some(token) = presented else {
            return Err(Error::Unauthenticated);
        };

        self.sessions
            .validate(token)
            .await?
            .ok_or(Error::Unauthenticated)
    }

    /// [`authenticate`](Self::authenticate), then load the account behind the session.
    ///
    /// An account that has been deleted or deactivated since the session was issued no longer
    /// gets through.
    #[instrument(skip_all, err(level = "debug"))]
    pub async fn authenticate_user(&self, presented: Option<&str>) -> Result<CurrentUser, Error> {
        let user_id = self.authenticate(presented).await?;

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        match Users::new(&mut conn).get_by_id(user_id).await? {
            Some(user) if user.active => Ok(CurrentUser::from(user)),
            Some(_) => {
                debug!(user_id, "Session belongs to a deactivated account");
                Err(Error::Unauthenticated)
            }
            None => {
                debug!(user_id, "Session belongs to a missing account");
                Err(Error::Unauthenticated)
            }
        }
    }

    /// May an account with `account_role` log in under `requested_group`?
    pub fn authorize_login(&self, account_role: AccessLevel, requested_group: &str) -> LoginDecision {
        roles::authorize_login(account_role, requested_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestDb, create_test_user};
    use std::time::Duration;

    async fn setup() -> (TestDb, AccessGate) {
        let db = TestDb::new().await;
        let sessions = SessionManager::new(db.pool.clone(), Duration::from_secs(24 * 60 * 60)).unwrap();
        let gate = AccessGate::new(db.pool.clone(), sessions);
        (db, gate)
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_token_is_unauthenticated() {
        let (_db, gate) = setup().await;
        assert!(matches!(gate.authenticate(None).await, Err(Error::Unauthenticated)));
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_token_is_unauthenticated() {
        let (_db, gate) = setup().await;
        assert!(matches!(gate.authenticate(Some("bogus")).await, Err(Error::Unauthenticated)));
    }

    #[test_log::test(tokio::test)]
    async fn test_expired_token_is_unauthenticated() {
        let (db, gate) = setup().await;
        let user = create_test_user(&db.pool, "ursula", AccessLevel::Viewer, "pw").await;

        let token = gate
            .sessions()
            .issue_at(user.id, chrono::Utc::now() - chrono::Duration::hours(25))
            .await
            .unwrap();

        assert!(matches!(gate.authenticate(Some(&token)).await, Err(Error::Unauthenticated)));
    }

    #[test_log::test(tokio::test)]
    async fn test_valid_token_resolves_user() {
        let (db, gate) = setup().await;
        let user = create_test_user(&db.pool, "victor", AccessLevel::Manager, "pw").await;
        let token = gate.sessions().issue(user.id).await.unwrap();

        assert_eq!(gate.authenticate(Some(&token)).await.unwrap(), user.id);

        let current = gate.authenticate_user(Some(&token)).await.unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.username, "victor");
        assert_eq!(current.role, AccessLevel::Manager);
    }

    #[test_log::test(tokio::test)]
    async fn test_logged_out_token_is_unauthenticated() {
        let (db, gate) = setup().await;
        let user = create_test_user(&db.pool, "wendy", AccessLevel::Analyst, "pw").await;
        let token = gate.sessions().issue(user.id).await.unwrap();

        gate.sessions().revoke(&token).await.unwrap();
        assert!(matches!(gate.authenticate(Some(&token)).await, Err(Error::Unauthenticated)));
    }

    #[test_log::test(tokio::test)]
    async fn test_deactivated_account_loses_access() {
        let (db, gate) = setup().await;
        let user = create_test_user(&db.pool, "xavier", AccessLevel::Analyst, "pw").await;
        let token = gate.sessions().issue(user.id).await.unwrap();

        let mut conn = db.pool.acquire().await.unwrap();
        Users::new(&mut conn).set_active(user.id, false).await.unwrap();
        drop(conn);

        // The bare session is still valid; the user-level check is what rejects it
        assert_eq!(gate.authenticate(Some(&token)).await.unwrap(), user.id);
        assert!(matches!(
            gate.authenticate_user(Some(&token)).await,
            Err(Error::Unauthenticated)
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_authorize_login_delegates_to_hierarchy() {
        let (_db, gate) = setup().await;
        assert_eq!(gate.authorize_login(AccessLevel::Manager, "analyst"), LoginDecision::Allowed);
        assert_eq!(gate.authorize_login(AccessLevel::Manager, "administrator"), LoginDecision::Denied);
        assert_eq!(gate.authorize_login(AccessLevel::Administrator, "root"), LoginDecision::Denied);
    }
}
