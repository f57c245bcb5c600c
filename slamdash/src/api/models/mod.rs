//! API request and response data models.
//!
//! These are distinct from [`crate::db::models`]; in particular no response type carries a
//! password hash.
//!
//! - [`auth`]: Login form and login page data
//! - [`users`]: Account views and the authenticated caller

pub mod auth;
pub mod users;
