use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tracing::info;

use crate::{
    AppState,
    api::models::auth::{LoginInfo, LoginRequest},
    auth::middleware::session_token_from_headers,
    config::Config,
    errors::{Error, LOGIN_PATH},
};

/// Where a successful login lands
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Get login page information
#[utoipa::path(
    get,
    path = "/login",
    tag = "authentication",
    responses(
        (status = 200, description = "Login page data", body = LoginInfo),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_login_info() -> Json<LoginInfo> {
    Json(LoginInfo::default())
}

/// Log in under a chosen access group
///
/// Verifies the credentials, checks the requested group against the account's role and, if both
/// pass, issues a session and redirects to the dashboard with the session cookie set.
#[utoipa::path(
    post,
    path = "/authenticate",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    tag = "authentication",
    responses(
        (status = 303, description = "Login successful, redirect to the dashboard with the session cookie set"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Access denied for selected group"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all, fields(username = %request.username, group = %request.group))]
pub async fn authenticate(State(state): State<AppState>, Form(request): Form<LoginRequest>) -> Result<Response, Error> {
    let user = state.credentials.verify(&request.username, &request.password).await?;

    if !state.gate.authorize_login(user.role, &request.group).is_allowed() {
        return Err(Error::AccessDenied {
            requested: request.group.parse().ok(),
        });
    }

    let token = state.gate.sessions().issue(user.id).await?;
    info!(user_id = user.id, role = %user.role, "User logged in");

    let cookie = create_session_cookie(&token, &state.config);
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(DASHBOARD_PATH)).into_response())
}

/// Login forms only post; anything else goes back to the login page.
#[tracing::instrument(skip_all)]
pub async fn redirect_to_login() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

/// Log out
///
/// Deletes the server-side session (if any), clears the cookie and redirects to the login page.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "authentication",
    responses(
        (status = 303, description = "Session ended, redirect to the login page"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, Error> {
    if let Some(token) = session_token_from_headers(&headers, &state.config.auth.session.cookie_name) {
        state.gate.sessions().revoke(&token).await?;
    }

    let cookie = clear_session_cookie(&state.config);
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(LOGIN_PATH)).into_response())
}

fn cookie_attributes(config: &Config) -> String {
    let session_config = &config.auth.session;
    // Validated at load time
    let same_site = session_config.same_site_attribute().unwrap_or("Lax");
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!("Path=/; HttpOnly; SameSite={same_site}{secure}")
}

fn create_session_cookie(token: &str, config: &Config) -> String {
    let max_age = config.auth.session.timeout.as_secs();

    format!(
        "{}={}; {}; Max-Age={}",
        config.auth.session.cookie_name,
        token,
        cookie_attributes(config),
        max_age
    )
}

fn clear_session_cookie(config: &Config) -> String {
    format!("{}=; {}; Max-Age=0", config.auth.session.cookie_name, cookie_attributes(config))
}
