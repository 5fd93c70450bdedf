//! # Configuration Management
//!
//! Loads application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. `HOST`/`PORT` environment variables (deployment platforms set these)
//! 2. Environment variables (APP_SERVER_HOST, APP_SERVER_PORT, ...)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)
//!
//! The synthesis parameters (44.1 kHz sample rate, 1024-sample buffers) are
//! process-wide constants in [`crate::audio`], not configuration: every client
//! decodes frames against those exact values.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub streaming: StreamingConfig,
}

/// Server bind settings.
///
/// - `host = "127.0.0.1"`: only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: accept connections from any address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Streaming resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Maximum number of concurrently registered beat sessions.
    pub max_concurrent_sessions: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            streaming: StreamingConfig {
                max_concurrent_sessions: 32,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config.toml, and the environment.
    ///
    /// `HOST` and `PORT` are handled as special cases on top of the `APP_`
    /// prefix convention because deployment platforms inject them directly.
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.streaming.max_concurrent_sessions == 0 {
            return Err(anyhow::anyhow!(
                "Max concurrent sessions must be greater than 0"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.streaming.max_concurrent_sessions = 0;
        assert!(config.validate().is_err());
    }
}
