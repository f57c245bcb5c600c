//! The credential store: verifying username/password pairs and bootstrapping the first account.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::{
    api::models::users::UserResponse,
    auth::{
        password::{self, Argon2Params},
        roles::AccessLevel,
    },
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::{CredentialFailure, Error},
};

/// Initial administrator account, created only when no accounts exist.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Verifies credentials against the `users` table.
///
/// Holds a clone of the shared pool; cloning the store is cheap.
#[derive(Clone)]
pub struct CredentialStore {
    db: SqlitePool,
    params: Argon2Params,
    /// Hash checked against when there is no usable account, so every rejection costs one
    /// Argon2 verification. Computed on first use.
    dummy_hash: Arc<OnceCell<String>>,
}

/// Password behind `dummy_hash`; never matches anything presented in practice
const DUMMY_PASSWORD: &str = "slamdash-no-such-account";

impl CredentialStore {
    pub fn new(db: SqlitePool, params: Argon2Params) -> Self {
        Self {
            db,
            params,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Spend the same Argon2 work as a real comparison, discarding the result.
    async fn burn_verification(&self, password: &str) -> Result<(), Error> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| password::hash_blocking(DUMMY_PASSWORD.to_string(), self.params))
            .await?;
        password::verify_blocking(password.to_string(), dummy.clone()).await?;
        Ok(())
    }

    /// Check `password` for `username`.
    ///
    /// Unknown, inactive and wrong-password attempts each fail with
    /// [`Error::InvalidCredentials`] carrying the precise reason for logs. An inactive account is
    /// rejected before its password is checked. Storage failures surface as [`Error::Database`].
    /// The returned record never includes the password hash.
    #[instrument(skip(self, password), err(level = "info"))]
    pub async fn verify(&self, username: &str, password: &str) -> Result<UserResponse, Error> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let user = Users::new(&mut conn).get_by_username(username).await?;
        // Release the connection before the slow hash comparison
        drop(conn);

        let Some(user) = user else {
            self.burn_verification(password).await?;
            return Err(Error::InvalidCredentials {
                reason: CredentialFailure::NotFound,
            });
        };

        if !user.active {
            self.burn_verification(password).await?;
            return Err(Error::InvalidCredentials {
                reason: CredentialFailure::Inactive,
            });
        }

        let is_valid = password::verify_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !is_valid {
            return Err(Error::InvalidCredentials {
                reason: CredentialFailure::BadCredential,
            });
        }

        debug!(user_id = user.id, role = %user.role, "Credentials verified");
        Ok(UserResponse::from(user))
    }

    /// Create the initial administrator if, and only if, the store holds no accounts.
    ///
    /// Returns the new account, or `None` when accounts already existed. Safe to call on every
    /// startup and from concurrent processes: the final insert is conditional on emptiness.
    #[instrument(skip(self, admin), fields(username = admin.username), err)]
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin<'_>) -> Result<Option<UserResponse>, Error> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        // Skip hashing entirely on the common path
        let existing = Users::new(&mut conn).count().await?;
        drop(conn);

        if existing > 0 {
            debug!("Accounts already present, skipping admin bootstrap");
            return Ok(None);
        }

        let password_hash = password::hash_blocking(admin.password.to_string(), self.params).await?;
        let request = UserCreateDBRequest {
            username: admin.username.to_string(),
            email: admin.email.to_string(),
            password_hash,
            role: AccessLevel::Administrator,
            active: true,
        };

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let created = Users::new(&mut conn).create_if_empty(&request).await?;
        match &created {
            Some(user) => info!(user_id = user.id, "Created initial administrator '{}'", user.username),
            None => debug!("Another process bootstrapped the store first"),
        }

        Ok(created.map(UserResponse::from))
    }

    /// Provision an account directly. Used by tests and administrative tooling.
    #[instrument(skip(self, password), err)]
    pub async fn create_account(&self, username: &str, email: &str, password: &str, role: AccessLevel) -> Result<UserResponse, Error> {
        let password_hash = password::hash_blocking(password.to_string(), self.params).await?;
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let user = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role,
                active: true,
            })
            .await?;

        Ok(UserResponse::from(user))
    }
}
