//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # Routes
//!
//! - `GET /healthz`: liveness
//! - `GET /`, `GET /login`: login page data (available groups)
//! - `POST /authenticate`: form login, sets the session cookie
//! - `GET|POST /logout`: ends the session
//! - `GET /dashboard`: protected; the authenticated account
//! - `GET /api-docs/openapi.json`: OpenAPI document generated by `utoipa`

pub mod handlers;
pub mod models;
