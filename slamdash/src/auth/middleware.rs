//! Route protection middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tracing::trace;

use crate::{AppState, errors::Error};

/// Pull the session token out of the request's `Cookie` header(s).
///
/// Returns `None` if no cookie named `cookie_name` is present, if its value is empty, or if the
/// header is not valid UTF-8.
pub fn session_token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Gate a router behind a valid session.
///
/// On success the resolved [`CurrentUser`](crate::api::models::users::CurrentUser) is stored in
/// the request extensions for the handler's extractor; on failure the wrapped handler is never
/// invoked and the caller is redirected to the login page.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, Error> {
    let token = session_token_from_headers(request.headers(), &state.config.auth.session.cookie_name);

    let user = state.gate.authenticate_user(token.as_deref()).await?;
    trace!(user_id = user.id, "Session accepted");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(COOKIE, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_single_cookie() {
        let h = headers(&["session_id=abc123"]);
        assert_eq!(session_token_from_headers(&h, "session_id").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_among_other_cookies() {
        let h = headers(&["theme=dark; session_id=abc123; lang=en"]);
        assert_eq!(session_token_from_headers(&h, "session_id").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_across_multiple_headers() {
        let h = headers(&["theme=dark", "session_id=xyz"]);
        assert_eq!(session_token_from_headers(&h, "session_id").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_missing_or_empty() {
        assert_eq!(session_token_from_headers(&HeaderMap::new(), "session_id"), None);
        assert_eq!(session_token_from_headers(&headers(&["other=1"]), "session_id"), None);
        assert_eq!(session_token_from_headers(&headers(&["session_id="]), "session_id"), None);
    }

    #[test]
    fn test_name_must_match_exactly() {
        let h = headers(&["my_session_id=nope; session_id_old=nope"]);
        assert_eq!(session_token_from_headers(&h, "session_id"), None);
    }

    #[test]
    fn test_custom_cookie_name() {
        let h = headers(&["session_id=default; slam=custom"]);
        assert_eq!(session_token_from_headers(&h, "slam").as_deref(), Some("custom"));
    }
}
