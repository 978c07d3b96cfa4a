//! Application configuration.
//!
//! Layered loading: `portal.toml` (optional), then environment variables
//! with the `PORTAL` prefix (`PORTAL__SESSION__TTL=45m`). Every field has
//! a default so the server starts with no configuration at all.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use portal_session::SessionConfig;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "portal.toml";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Session lifecycle and security settings.
    pub session: SessionConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,
}

impl ServerConfig {
    /// Returns the bind address as `host:port`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,

    /// Record allow/success audit events (disable in high-volume
    /// environments; denials and blocks are always recorded).
    pub audit_successes: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            audit_successes: true,
        }
    }
}

/// Loads configuration from the given file (optional) plus environment.
///
/// # Errors
///
/// Returns an error when the file exists but fails to parse, or when an
/// environment override has the wrong shape.
pub fn load_config(path: &str) -> Result<AppConfig, config::ConfigError> {
    Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(false))
        .add_source(Environment::with_prefix("PORTAL").separator("__"))
        .build()?
        .try_deserialize()
}
