//! Session issuance, validation and revocation.
//!
//! Sessions are opaque: the token is 32 bytes from the thread-local CSPRNG, base64url encoded, and carries
//! no structure. Its only meaning is as the primary key of a `sessions` row. The expiry is fixed
//! at issuance and never extended.
//!
//! The `*_at` variants take the current time as an argument so expiry can be exercised without
//! waiting; the plain variants use [`Utc::now`].

use std::time::Duration as StdDuration;

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use rand::prelude::RngExt;
use rand::rng;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::{
    db::{
        handlers::{Repository, Sessions},
        models::sessions::SessionCreateDBRequest,
    },
    errors::Error,
    types::{SessionToken, UserId, abbrev_token},
};

/// Bytes of entropy in a session token
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Generate a fresh session token: 256 random bits, base64url without padding (43 chars).
pub fn generate_session_token() -> SessionToken {
    let mut token_bytes = [0u8; SESSION_TOKEN_BYTES];
    rng().fill(&mut token_bytes);

    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Issues and checks session tokens against the `sessions` table.
#[derive(Clone)]
pub struct SessionManager {
    db: SqlitePool,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(db: SqlitePool, ttl: StdDuration) -> Result<Self, Error> {
        let ttl = Duration::from_std(ttl).map_err(|e| Error::Internal {
            operation: format!("convert session timeout: {e}"),
        })?;
        Ok(Self { db, ttl })
    }

    /// Fixed lifetime of every session this manager issues
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn issue(&self, user_id: UserId) -> Result<SessionToken, Error> {
        self.issue_at(user_id, Utc::now()).await
    }

    /// Create a session for `user_id` valid over `[now, now + ttl)`.
    ///
    /// The token is only returned once the row is committed; on a storage error the caller has
    /// nothing to hand to the client.
    #[instrument(skip(self), err)]
    pub async fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<SessionToken, Error> {
        let request = SessionCreateDBRequest {
            token: generate_session_token(),
            user_id,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let session = Sessions::new(&mut conn).create(&request).await?;

        debug!(token = %abbrev_token(&session.id), expires_at = %session.expires_at, "Issued session");
        Ok(session.id)
    }

    pub async fn validate(&self, token: &str) -> Result<Option<UserId>, Error> {
        self.validate_at(token, Utc::now()).await
    }

    /// Resolve `token` to its owner, or `None` if the token is unknown or `now` is at or past its
    /// expiry. The two cases are deliberately indistinguishable to the caller. Never modifies the
    /// session.
    #[instrument(skip(self, token), fields(token = %abbrev_token(token)), err)]
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Option<UserId>, Error> {
        if token.is_empty() {
            return Ok(None);
        }

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let Some(session) = Sessions::new(&mut conn).get(token).await? else {
            debug!("Unknown session token");
            return Ok(None);
        };

        if !session.is_valid_at(now) {
            debug!(expired_at = %session.expires_at, "Session expired");
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }

    /// Delete the session if it exists. Revoking an unknown or already revoked token is a no-op.
    #[instrument(skip(self, token), fields(token = %abbrev_token(token)), err)]
    pub async fn revoke(&self, token: &str) -> Result<(), Error> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        if Sessions::new(&mut conn).delete(token).await? {
            debug!("Revoked session");
        }
        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64, Error> {
        self.purge_expired_at(Utc::now()).await
    }

    /// Delete every session whose expiry is at or before `now`.
    #[instrument(skip(self), err)]
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok(Sessions::new(&mut conn).delete_expired(now).await?)
    }
}

/// Periodically purge expired sessions until `shutdown` is cancelled.
///
/// The first sweep runs immediately. Failures are logged and retried on the next tick.
pub fn spawn_session_sweeper(sessions: SessionManager, interval: StdDuration, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval = ?interval, "Starting expired session sweeper");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Expired session sweeper shutting down");
                    return;
                }
                _ = timer.tick() => {}
            }

            match sessions.purge_expired().await {
                Ok(0) => debug!("No expired sessions to purge"),
                Ok(count) => info!(count, "Purged expired sessions"),
                Err(e) => error!(error = %e, "Failed to purge expired sessions"),
            }
        }
    })
}
