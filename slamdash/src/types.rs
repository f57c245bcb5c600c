//! Common type definitions.
//!
//! # ID Types
//!
//! - [`UserId`]: User account identifier (SQLite rowid)
//! - [`SessionToken`]: Opaque session bearer token
//!
//! # Utility Functions
//!
//! - [`abbrev_token`]: Abbreviate tokens to their first 8 chars for logging

// Type aliases for IDs
pub type UserId = i64;
pub type SessionToken = String;

/// Abbreviate a session token to its first 8 characters so traces never carry a usable credential.
/// Example: "q3Xk1V0b9Jm...": -> "q3Xk1V0b"
pub fn abbrev_token(token: &str) -> String {
    token.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_token() {
        assert_eq!(abbrev_token("0123456789abcdef"), "01234567");
        assert_eq!(abbrev_token("abc"), "abc");
        assert_eq!(abbrev_token(""), "");
    }
}
