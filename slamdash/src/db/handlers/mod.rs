//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed SQLite connection (which may be a transaction) and exposes
//! strongly typed operations over one table, returning records from [`crate::db::models`].
//!
//! - [`Users`]: Dashboard accounts
//! - [`Sessions`]: Issued session tokens
//!
//! ```ignore
//! use slamdash::db::handlers::{Repository, Users};
//!
//! let mut conn = pool.acquire().await?;
//! let mut users = Users::new(&mut conn);
//! if let Some(user) = users.get_by_username("admin").await? {
//!     println!("{} is a {}", user.username, user.role);
//! }
//! ```

pub mod repository;
pub mod sessions;
pub mod users;

pub use repository::Repository;
pub use sessions::Sessions;
pub use users::Users;
