//! OpenAPI documentation, served at `/api-docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api::{
    self,
    models::{
        auth::{LoginInfo, LoginRequest},
        users::UserResponse,
    },
};
use crate::auth::roles::AccessLevel;

struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "SessionCookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "session_id",
                    "Opaque session token set by POST /authenticate. The cookie name is configurable.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "slamdash", description = "Session login and role-gated access for the SL&AM records dashboard"),
    modifiers(&SessionCookieAddon),
    paths(
        api::handlers::auth::get_login_info,
        api::handlers::auth::authenticate,
        api::handlers::auth::logout,
        api::handlers::dashboard::dashboard,
    ),
    components(schemas(AccessLevel, LoginInfo, LoginRequest, UserResponse)),
    tags(
        (name = "authentication", description = "Login and logout"),
        (name = "dashboard", description = "Pages behind the login wall"),
    )
)]
pub struct ApiDoc;
