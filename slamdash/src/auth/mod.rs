//! Session authentication with role-gated login.
//!
//! Three components, each holding a clone of the shared pool:
//!
//! - [`credentials::CredentialStore`]: verifies username/password and bootstraps the first
//!   administrator
//! - [`session::SessionManager`]: issues, validates and revokes opaque session tokens
//! - [`gate::AccessGate`]: resolves the caller of a protected request, or rejects it
//!
//! plus the static [`roles`] hierarchy consulted once at login.
//!
//! # Login flow
//!
//! ```text
//! POST /authenticate
//!   CredentialStore::verify ──✗──> 401 "Invalid credentials"
//!          │
//!   roles::authorize_login ──✗──> 403 "Access denied for selected group"
//!          │
//!   SessionManager::issue ───✗──> 500
//!          │
//!   303 /dashboard + Set-Cookie
//! ```
//!
//! # Protected requests
//!
//! Routes behind [`middleware::require_session`] never run without a valid session; handlers
//! receive the caller through the [`CurrentUser`](crate::api::models::users::CurrentUser)
//! extractor:
//!
//! ```ignore
//! async fn handler(current_user: CurrentUser) -> Json<CurrentUser> {
//!     Json(current_user)
//! }
//! ```

pub mod credentials;
pub mod current_user;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod session;
