//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults, validated once at startup so a malformed value fails fast
//! instead of surfacing mid-request.

use serde::{Deserialize, Serialize};
use std::env;

/// REST server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Maximum database pool connections
    pub max_db_connections: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            port: env::var("MERIDIAN_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MERIDIAN_PORT".to_string()))?,

            database_path: env::var("MERIDIAN_DATABASE_PATH")
                .unwrap_or_else(|_| "meridian.db".to_string()),

            max_db_connections: env::var("MERIDIAN_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("MERIDIAN_DB_MAX_CONNECTIONS".to_string())
                })?,
        };

        if config.max_db_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "MERIDIAN_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Only assert defaults when the variables are not set in the
        // test environment.
        if env::var("MERIDIAN_PORT").is_err() && env::var("MERIDIAN_DB_MAX_CONNECTIONS").is_err() {
            let config = ServerConfig::load().unwrap();
            assert_eq!(config.port, 3000);
            assert_eq!(config.max_db_connections, 5);
        }
    }
}
