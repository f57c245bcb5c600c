//! Test utilities shared by unit and handler tests.

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use tempfile::TempDir;

use crate::{
    auth::{
        password::{Argon2Params, hash_string_with_params},
        roles::AccessLevel,
    },
    config::{Config, PasswordConfig},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
};

/// A migrated SQLite database in a temporary directory, removed on drop.
///
/// A file rather than `:memory:` so every pooled connection sees the same data.
pub struct TestDb {
    pub pool: SqlitePool,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("test.db"))
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            // Durability is irrelevant for a throwaway database
            .synchronous(SqliteSynchronous::Off)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("Failed to open test database");

        crate::migrator().run(&pool).await.expect("Failed to run migrations");

        Self { pool, _dir: dir }
    }
}

/// Argon2 parameters cheap enough for tests
pub fn fast_argon2_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };

    let fast = fast_argon2_params();
    config.auth.password = PasswordConfig {
        argon2_memory_kib: fast.memory_kib,
        argon2_iterations: fast.iterations,
        argon2_parallelism: fast.parallelism,
    };
    // Tests that need the sweeper turn it on explicitly
    config.auth.session_sweep.enabled = false;

    config
}

/// Insert an active account with the given role and password
pub async fn create_test_user(pool: &SqlitePool, username: &str, role: AccessLevel, password: &str) -> UserDBResponse {
    let password_hash = hash_string_with_params(password, Some(fast_argon2_params())).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash,
            role,
            active: true,
        })
        .await
        .expect("Failed to create test user")
}

/// Full application on `pool`, including the bootstrapped `admin` account.
pub async fn create_test_app(pool: SqlitePool) -> (TestServer, crate::BackgroundServices) {
    let app = crate::Application::new_with_pool(create_test_config(), pool)
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

/// The `name=value` pair from a response's `Set-Cookie` header, ready for a `Cookie` header
pub fn session_cookie_from(response: &TestResponse) -> String {
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("No Set-Cookie header")
        .to_str()
        .expect("Non-UTF8 Set-Cookie header");

    set_cookie.split(';').next().unwrap_or_default().to_string()
}

/// Log in through the HTTP API and return the session cookie pair
pub async fn login(server: &TestServer, username: &str, password: &str, group: &str) -> String {
    let response = server
        .post("/authenticate")
        .form(&[("username", username), ("password", password), ("group", group)])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    session_cookie_from(&response)
}
