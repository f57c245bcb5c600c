//! Extractor giving handlers the authenticated caller as an explicit argument.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::middleware::session_token_from_headers,
    errors::{Error, Result},
};

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Already resolved by require_session
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            trace!(user_id = user.id, "Using user resolved by middleware");
            return Ok(user.clone());
        }

        let token = session_token_from_headers(&parts.headers, &state.config.auth.session.cookie_name);
        state.gate.authenticate_user(token.as_deref()).await
    }
}
