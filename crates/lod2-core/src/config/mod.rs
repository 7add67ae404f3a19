//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `LOD2__*` environment variables. Each sub-module is one
//! logical configuration section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::{AuthConfig, BootstrapConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Every section falls back to its defaults, so an empty configuration
/// produces a runnable server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token, cookie and password settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Bootstrap administrator account.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment name.
    ///
    /// Merges `config/default.toml`, the `config/{env}.toml` overlay, and
    /// environment variables prefixed with `LOD2__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LOD2")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_yields_defaults() {
        let config: AppConfig = config::Config::builder()
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("defaults deserialize");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.issuer, "https://lod2.zip");
        assert_eq!(config.auth.access_token_ttl_seconds, 900);
        assert_eq!(config.auth.starting_invites, 5);
        assert_eq!(config.bootstrap.admin_username, "admin");
    }

    #[test]
    fn test_toml_overrides_single_field() {
        let toml = r#"
            [auth]
            refresh_cookie_name = "custom.refresh"
            cookie_secure = false
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("toml deserializes");

        assert_eq!(config.auth.refresh_cookie_name, "custom.refresh");
        assert!(!config.auth.cookie_secure);
        assert_eq!(config.auth.access_cookie_name, "lod2.access");
    }
}
