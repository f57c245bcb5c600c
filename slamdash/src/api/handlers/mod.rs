//! HTTP request handlers.
//!
//! - [`auth`]: Login page data, login and logout
//! - [`dashboard`]: The protected landing page

pub mod auth;
pub mod dashboard;
