use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserResponse},
    db::handlers::{Repository, Users},
    errors::Error,
};

/// Get the authenticated account
///
/// Stand-in for the dashboard page: the record-keeping views behind it only need to know who is
/// calling.
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "The logged in account", body = UserResponse),
        (status = 303, description = "No valid session, redirect to the login page"),
    ),
    security(("SessionCookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn dashboard(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or(Error::Unauthenticated)?;

    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::roles::AccessLevel,
        test_utils::{TestDb, create_test_app, create_test_user, login},
    };
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use chrono::Utc;

    #[test_log::test(tokio::test)]
    async fn test_dashboard_requires_session() {
        let db = TestDb::new().await;
        let (server, _bg) = create_test_app(db.pool.clone()).await;

        let response = server.get("/dashboard").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/login");

        let response = server
            .get("/dashboard")
            .add_header(HeaderName::from_static("cookie"), HeaderValue::from_static("session_id=forged"))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
    }

    #[test_log::test(tokio::test)]
    async fn test_dashboard_returns_logged_in_account() {
        let db = TestDb::new().await;
        let user = create_test_user(&db.pool, "dana", AccessLevel::Manager, "pw").await;
        let (server, _bg) = create_test_app(db.pool.clone()).await;

        let cookie = login(&server, "dana", "pw", "viewer").await;

        let response = server
            .get("/dashboard")
            .add_header(HeaderName::from_static("cookie"), HeaderValue::from_str(&cookie).unwrap())
            .await;
        response.assert_status_ok();

        let body: UserResponse = response.json();
        assert_eq!(body.id, user.id);
        assert_eq!(body.username, "dana");
        // The session does not carry the chosen group; the account role is reported
        assert_eq!(body.role, AccessLevel::Manager);
    }

    #[test_log::test(tokio::test)]
    async fn test_dashboard_rejects_expired_session() {
        let db = TestDb::new().await;
        let user = create_test_user(&db.pool, "eve", AccessLevel::Viewer, "pw").await;
        let (server, _bg) = create_test_app(db.pool.clone()).await;

        let state = crate::AppState::from_pool(db.pool.clone(), crate::test_utils::create_test_config()).unwrap();
        let token = state
            .gate
            .sessions()
            .issue_at(user.id, Utc::now() - chrono::Duration::hours(24) - chrono::Duration::seconds(1))
            .await
            .unwrap();

        let response = server
            .get("/dashboard")
            .add_header(
                HeaderName::from_static("cookie"),
                HeaderValue::from_str(&format!("session_id={token}")).unwrap(),
            )
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/login");
    }
}
