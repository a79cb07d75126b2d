//! Configuration management for Pedidos
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Secret used when none is configured. Never acceptable outside development.
pub const DEVELOPMENT_SESSION_SECRET: &str = "pedidos-development-secret";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Deployment environment, taken from `APP_ENV` when loading
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Session / authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Time allowed for in-flight requests to drain on shutdown, in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Maximum concurrent requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Create missing tables on startup
    #[serde(default = "default_enabled")]
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HMAC secret for signing session tokens
    pub session_secret: Option<String>,

    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the session cookie `Secure`
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_enabled")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_environment() -> String { "development".to_string() }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_max_concurrent() -> usize { 100 }
fn default_database_url() -> String { "sqlite://pedidos.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_session_ttl() -> u64 { 86_400 }
fn default_cookie_name() -> String { "pedidos_session".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "pedidos".to_string() }
fn default_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            read_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            auto_migrate: default_enabled(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: None,
            session_ttl_secs: default_session_ttl(),
            cookie_name: default_cookie_name(),
            secure_cookies: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_enabled(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, config files and environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("environment", env.clone())?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Configuration for tests: private in-memory SQLite, fixed secret, no exporter
    pub fn for_tests() -> Self {
        let mut config = Self::default();
        config.database.url = "sqlite::memory:".to_string();
        // every connection to `sqlite::memory:` opens its own database
        config.database.max_connections = 1;
        config.database.min_connections = 1;
        config.auth.session_secret = Some("pedidos-test-secret".to_string());
        config.observability.json_logging = false;
        config.observability.metrics_port = 0;
        config
    }

    /// Reject settings the service cannot run with
    pub fn check(&self) -> crate::Result<()> {
        let invalid = |message: &str| {
            Err(crate::AppError::Configuration {
                message: message.to_string(),
            })
        };

        let has_secret = self
            .auth
            .session_secret
            .as_deref()
            .is_some_and(|secret| !secret.is_empty());
        if self.is_production() && !has_secret {
            return invalid("auth.session_secret is required in production");
        }
        if self.auth.session_ttl_secs == 0 {
            return invalid("auth.session_ttl_secs must be positive");
        }
        let cookie_name_ok = !self.auth.cookie_name.is_empty()
            && self
                .auth
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !cookie_name_ok {
            return invalid("auth.cookie_name must be a non-empty token of [A-Za-z0-9_-]");
        }
        let db = &self.database;
        if db.max_connections == 0 || db.min_connections > db.max_connections {
            return invalid("database.min_connections must not exceed a non-zero max_connections");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown drain timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Session signing secret, falling back to the development secret
    pub fn session_secret(&self) -> &str {
        match self.auth.session_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => DEVELOPMENT_SESSION_SECRET,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.cookie_name, "pedidos_session");
        assert!(config.database.auto_migrate);
    }

    #[test]
    fn test_session_secret_fallback() {
        let mut config = AppConfig::default();
        assert_eq!(config.session_secret(), DEVELOPMENT_SESSION_SECRET);

        config.auth.session_secret = Some(String::new());
        assert_eq!(config.session_secret(), DEVELOPMENT_SESSION_SECRET);

        config.auth.session_secret = Some("s3cret".into());
        assert_eq!(config.session_secret(), "s3cret");
    }

    #[test]
    fn test_check() {
        assert!(AppConfig::default().check().is_ok());
        assert!(AppConfig::for_tests().check().is_ok());

        let mut config = AppConfig::default();
        config.auth.cookie_name = "bad name;".into();
        assert!(matches!(
            config.check(),
            Err(crate::AppError::Configuration { .. })
        ));

        let mut config = AppConfig::default();
        config.auth.session_ttl_secs = 0;
        assert!(config.check().is_err());
    }

    #[test]
    fn test_check_requires_secret_in_production() {
        let mut config = AppConfig::default();
        config.environment = "production".into();
        assert!(matches!(
            config.check(),
            Err(crate::AppError::Configuration { .. })
        ));

        config.auth.session_secret = Some(String::new());
        assert!(config.check().is_err());

        config.auth.session_secret = Some("prod-secret".into());
        assert!(config.check().is_ok());

        // development keeps booting on the fallback secret
        config.environment = "development".into();
        config.auth.session_secret = None;
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_config_for_tests_uses_single_memory_connection() {
        let config = AppConfig::for_tests();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 1);
        assert_eq!(config.observability.metrics_port, 0);
    }
}
