//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `SLAMDASH_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Later sources override earlier ones:
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `SLAMDASH_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested values, use double underscores: `SLAMDASH_AUTH__SESSION__COOKIE_SECURE=true` sets
//! `auth.session.cookie_secure`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use slamdash::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! SLAMDASH_PORT=9090
//! DATABASE_URL="sqlite:///var/lib/slamdash/slam.db"
//! SLAMDASH_AUTH__SESSION__TIMEOUT=8h
//! SLAMDASH_ADMIN_PASSWORD="rotate-me"
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "SLAMDASH_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty or missing file yields a working development setup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Raw `DATABASE_URL`, folded into `database.url` by [`Config::load`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    /// Username of the administrator created when the user table is empty
    pub admin_username: String,
    pub admin_email: String,
    /// Initial administrator password. Operators are expected to rotate it after first login.
    pub admin_password: String,
    pub auth: AuthConfig,
}

/// SQLite connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLx connection URL, e.g. `sqlite://slam.db`. The file is created if missing.
    pub url: String,
    pub pool: PoolSettings,
}

/// Pool configuration with the SQLx parameters we expose.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub session: SessionConfig,
    pub password: PasswordConfig,
    pub session_sweep: SessionSweepConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Fixed lifetime of a session from the moment it is issued
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

/// Argon2 cost parameters for new password hashes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default: 2)
    pub argon2_iterations: u32,
    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

/// Periodic deletion of expired session rows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSweepConfig {
    pub enabled: bool,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            database: DatabaseConfig::default(),
            admin_username: "admin".to_string(),
            admin_email: "admin@slam.local".to_string(),
            admin_password: "admin123".to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://slam.db".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,  // 10 minutes
            max_lifetime_secs: 1800, // 30 minutes
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(24 * 60 * 60),
            cookie_name: "session_id".to_string(),
            cookie_secure: false,
            cookie_same_site: "lax".to_string(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for SessionSweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60 * 60),
        }
    }
}

impl SessionConfig {
    /// The `SameSite` attribute value as it appears in a `Set-Cookie` header, or `None` if the
    /// configured string is not one of strict/lax/none.
    pub fn same_site_attribute(&self) -> Option<&'static str> {
        match self.cookie_same_site.to_ascii_lowercase().as_str() {
            "strict" => Some("Strict"),
            "lax" => Some("Lax"),
            "none" => Some("None"),
            _ => None,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let session = &self.auth.session;

        if session.timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: auth.session.timeout must be greater than zero".to_string(),
            });
        }

        if session.cookie_name.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: auth.session.cookie_name cannot be empty".to_string(),
            });
        }

        match session.same_site_attribute() {
            None => {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: auth.session.cookie_same_site must be one of strict, lax or none (got '{}')",
                        session.cookie_same_site
                    ),
                });
            }
            // Browsers drop SameSite=None cookies that are not also Secure
            Some("None") if !session.cookie_secure => {
                return Err(Error::Internal {
                    operation: "Config validation: auth.session.cookie_same_site=none requires cookie_secure=true".to_string(),
                });
            }
            Some(_) => {}
        }

        if self.admin_username.trim().is_empty() || self.admin_email.trim().is_empty() || self.admin_password.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: admin_username, admin_email and admin_password must all be set".to_string(),
            });
        }

        if self.auth.session_sweep.enabled && self.auth.session_sweep.interval.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: auth.session_sweep.interval must be greater than zero when the sweep is enabled"
                    .to_string(),
            });
        }

        if self.database.url.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: database.url cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // SLAMDASH_CONFIG names the file itself and is not a config key
            .merge(Env::prefixed("SLAMDASH_").ignore(&["config"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.bind_address(), "0.0.0.0:8080");
            assert_eq!(config.database.url, "sqlite://slam.db");
            assert_eq!(config.admin_username, "admin");
            assert_eq!(config.admin_email, "admin@slam.local");
            assert_eq!(config.admin_password, "admin123");
            assert_eq!(config.auth.session.timeout, Duration::from_secs(86400));
            assert_eq!(config.auth.session.cookie_name, "session_id");
            assert!(!config.auth.session.cookie_secure);
            assert_eq!(config.auth.session.same_site_attribute(), Some("Lax"));
            assert!(config.auth.session_sweep.enabled);
            assert_eq!(config.auth.session_sweep.interval, Duration::from_secs(3600));

            Ok(())
        });
    }

    #[test]
    fn test_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 3000
database:
  url: sqlite://records.db
  pool:
    max_connections: 4
auth:
  session:
    timeout: 8h
    cookie_name: slam_session
    cookie_secure: true
    cookie_same_site: strict
  session_sweep:
    interval: 15m
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 3000);
            assert_eq!(config.database.url, "sqlite://records.db");
            assert_eq!(config.database.pool.max_connections, 4);
            // Unspecified pool fields keep their defaults
            assert_eq!(config.database.pool.acquire_timeout_secs, 30);
            assert_eq!(config.auth.session.timeout, Duration::from_secs(8 * 3600));
            assert_eq!(config.auth.session.cookie_name, "slam_session");
            assert_eq!(config.auth.session.same_site_attribute(), Some("Strict"));
            assert_eq!(config.auth.session_sweep.interval, Duration::from_secs(15 * 60));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 3000\nadmin_username: root\n")?;

            jail.set_env("SLAMDASH_HOST", "127.0.0.1");
            jail.set_env("SLAMDASH_PORT", "9090");
            jail.set_env("SLAMDASH_AUTH__SESSION__COOKIE_NAME", "sid");
            jail.set_env("SLAMDASH_CONFIG", "test.yaml");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 9090);
            assert_eq!(config.auth.session.cookie_name, "sid");
            // YAML values not overridden are preserved
            assert_eq!(config.admin_username, "root");

            Ok(())
        });
    }

    #[test]
    fn test_database_url_env() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "database:\n  url: sqlite://from-file.db\n")?;
            jail.set_env("DATABASE_URL", "sqlite://from-env.db");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.database.url, "sqlite://from-env.db");
            assert!(config.database_url.is_none());

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "auth:\n  session:\n    cookie_domain: example.com\n")?;

            assert!(Config::load(&args("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.auth.session.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.session.cookie_name = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.session.cookie_same_site = "sometimes".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.session.cookie_same_site = "none".to_string();
        assert!(config.validate().is_err());
        config.auth.session.cookie_secure = true;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.admin_password = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.session_sweep.interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.auth.session_sweep.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_error_surfaces_from_load() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "auth:\n  session:\n    timeout: 0s\n")?;

            let err = Config::load(&args("test.yaml")).unwrap_err();
            assert!(err.to_string().contains("timeout"));

            Ok(())
        });
    }
}
