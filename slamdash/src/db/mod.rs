//! Database layer for data persistence and access.
//!
//! SQLx over SQLite, organised as repositories:
//!
//! ```text
//! ┌─────────────┐
//! │  auth/api   │  (credential store, session manager, handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! Schema lives in `migrations/` and is applied at startup by [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
