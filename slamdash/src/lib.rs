//! # slamdash: session login for the SL&AM records dashboard
//!
//! The SL&AM dashboard keeps licenses, assets, risks, FOI requests and calendar events behind a
//! login wall. This crate is that wall: it verifies usernames and passwords, lets a user pick the
//! access group they work under (never above their own role), issues an opaque session cookie, and
//! turns every later request into either an identified caller or a redirect to the login page.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); persistence is SQLite through
//! SQLx. One pool is opened by [`Application`] and shared by the three auth components:
//!
//! - [`auth::credentials::CredentialStore`] checks credentials and creates the first
//!   administrator on an empty database
//! - [`auth::session::SessionManager`] issues, validates and revokes sessions with a fixed 24h
//!   window by default
//! - [`auth::gate::AccessGate`] fronts every protected route
//!
//! The role hierarchy in [`auth::roles`] (administrator > manager > analyst > viewer) is consulted
//! once, at login.
//!
//! ## Request Flow
//!
//! `POST /authenticate` verifies the form's credentials, checks the requested group, issues a
//! session and redirects to `/dashboard` with the cookie set. Requests to protected routes pass
//! through [`auth::middleware::require_session`]; without a valid session they are redirected to
//! `/login` and the handler never runs. `/logout` deletes the session row and clears the cookie.
//!
//! ## Background Services
//!
//! An optional sweeper deletes expired session rows on an interval. Validity never depends on
//! it: an expired row is rejected whether or not it has been swept.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::{str::FromStr, time::Duration};

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};
use utoipa::OpenApi;

use crate::{
    auth::{
        credentials::{BootstrapAdmin, CredentialStore},
        gate::AccessGate,
        middleware::require_session,
        password::Argon2Params,
        session::{SessionManager, spawn_session_sweeper},
    },
    config::DatabaseConfig,
    errors::Error,
    openapi::ApiDoc,
};

pub use config::Config;
pub use types::{SessionToken, UserId};

/// Application state shared across all request handlers.
///
/// - `db`: the SQLite pool, shared with the components below
/// - `config`: application configuration
/// - `credentials`: username/password verification
/// - `gate`: session resolution for protected routes; owns the [`SessionManager`]
///
/// ```ignore
/// let state = AppState::from_pool(pool, config)?;
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub credentials: CredentialStore,
    pub gate: AccessGate,
}

impl AppState {
    /// Wire the auth components onto `db` using the settings in `config`.
    pub fn from_pool(db: SqlitePool, config: Config) -> Result<Self, Error> {
        let credentials = CredentialStore::new(db.clone(), Argon2Params::from(&config.auth.password));
        let sessions = SessionManager::new(db.clone(), config.auth.session.timeout)?;
        let gate = AccessGate::new(db.clone(), sessions);

        Ok(Self::builder().db(db).config(config).credentials(credentials).gate(gate).build())
    }
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the configured administrator if the user table is empty.
///
/// Idempotent: does nothing once any account exists, including after the administrator's password
/// has been rotated. Returns the new account's id when one was created.
pub async fn create_initial_admin_user(config: &Config, credentials: &CredentialStore) -> Result<Option<UserId>, Error> {
    let admin = BootstrapAdmin {
        username: &config.admin_username,
        email: &config.admin_email,
        password: &config.admin_password,
    };

    let created = credentials.bootstrap_admin(&admin).await?;
    if created.is_some() {
        info!(
            "Created initial administrator '{}' with the configured password; rotate it after first login",
            config.admin_username
        );
    }
    Ok(created.map(|user| user.id))
}

/// Open the SQLite pool described by `config`, creating the database file if needed.
pub async fn connect_pool(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let settings = &config.pool;
    let non_zero = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(non_zero(settings.idle_timeout_secs))
        .max_lifetime(non_zero(settings.max_lifetime_secs))
        .connect_with(options)
        .await?;

    Ok(pool)
}

async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    info!("Opening database {}", config.database.url);
    let pool = connect_pool(&config.database).await?;
    migrator().run(&pool).await?;
    Ok(pool)
}

/// Build the HTTP router for `state`.
pub fn build_router(state: &AppState) -> Router {
    // Everything in here sits behind the login wall
    let protected = Router::new()
        .route("/dashboard", get(api::handlers::dashboard::dashboard))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/", get(api::handlers::auth::get_login_info))
        .route("/login", get(api::handlers::auth::get_login_info))
        .route(
            "/authenticate",
            post(api::handlers::auth::authenticate).get(api::handlers::auth::redirect_to_login),
        )
        .route(
            "/logout",
            get(api::handlers::auth::logout).post(api::handlers::auth::logout),
        )
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(protected)
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Background tasks running alongside the HTTP server.
///
/// Dropping this cancels the shutdown token through `drop_guard`, so tasks never outlive it.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: tokio_util::sync::CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<tokio_util::sync::DropGuard>,
}

impl BackgroundServices {
    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();

        for handle in self.background_tasks {
            if let Err(e) = handle.await {
                tracing::warn!("Background task panicked during shutdown: {}", e);
            }
        }
    }
}

fn setup_background_services(sessions: &SessionManager, config: &Config, shutdown_token: tokio_util::sync::CancellationToken) -> BackgroundServices {
    let drop_guard = shutdown_token.clone().drop_guard();
    let mut background_tasks = Vec::new();

    if config.auth.session_sweep.enabled {
        background_tasks.push(spawn_session_sweeper(
            sessions.clone(),
            config.auth.session_sweep.interval,
            shutdown_token.clone(),
        ));
    } else {
        info!("Expired session sweeper disabled");
    }

    BackgroundServices {
        background_tasks,
        shutdown_token,
        drop_guard: Some(drop_guard),
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations, bootstraps the
///    administrator and starts background services
/// 2. **Serve**: [`Application::serve`] binds the listener and handles requests until the
///    shutdown future resolves, then stops background tasks and closes the pool
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting slamdash with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool).await
    }

    /// Create an application on an existing pool. Migrations are applied if missing.
    pub async fn new_with_pool(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        migrator().run(&pool).await?;

        let app_state = AppState::from_pool(pool.clone(), config.clone())?;

        create_initial_admin_user(&config, &app_state.credentials)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

        let shutdown_token = tokio_util::sync::CancellationToken::new();
        let bg_services = setup_background_services(app_state.gate.sessions(), &config, shutdown_token);

        let router = build_router(&app_state);

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("slamdash listening on http://{}, available at http://localhost:{}", bind_addr, self.config.port);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        // Shutdown background services and wait for tasks to complete
        self.bg_services.shutdown().await;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
