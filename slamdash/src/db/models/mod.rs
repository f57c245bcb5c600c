//! Database record models matching table schemas.
//!
//! These structs correspond to rows of the `users` and `sessions` tables and are
//! what the repositories in [`crate::db::handlers`] accept and return. They are
//! kept separate from the API models in [`crate::api::models`] so that storage
//! details (such as the password hash) never leak into responses by accident.
//!
//! - [`users`]: Dashboard accounts and their access level
//! - [`sessions`]: Opaque bearer sessions with a fixed expiry

pub mod sessions;
pub mod users;
