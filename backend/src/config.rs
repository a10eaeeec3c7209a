//! Configuration management for the inventory analytics server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with IA__ prefix
//! 4. The ODOO_*, HOST, PORT and MCP_TRANSPORT deployment variables

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Which transport the binary serves tool calls over
    pub transport: Transport,

    /// Server configuration
    pub server: ServerConfig,

    /// ERP connection settings
    pub odoo: OdooConfig,

    /// Analysis defaults
    pub analysis: AnalysisConfig,
}

/// Tool-call transport
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Line-delimited JSON over stdin/stdout
    #[default]
    Stdio,
    /// axum HTTP server
    #[serde(alias = "sse")]
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OdooConfig {
    /// Base URL of the ERP instance, without trailing slash
    #[serde(default)]
    pub url: String,

    /// Database name
    #[serde(default)]
    pub database: String,

    /// Login used for authentication
    #[serde(default)]
    pub username: String,

    /// API key used in place of a password
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Stock location analysed when a call does not name one (WH/Stock)
    pub default_location_id: i64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("IA_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        let port = env("PORT");
        let transport = if port.is_some() {
            Some("http".to_string())
        } else {
            env("MCP_TRANSPORT")
        };

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("transport", "stdio")?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("odoo.timeout_secs", 60)?
            .set_default("analysis.default_location_id", shared::DEFAULT_LOCATION_ID)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IA__ prefix)
            .add_source(
                Environment::with_prefix("IA")
                    .separator("__")
                    .try_parsing(true),
            )
            // Deployment variables win
            .set_override_option(
                "odoo.url",
                env("ODOO_URL").map(|url| url.trim_end_matches('/').to_string()),
            )?
            .set_override_option("odoo.database", env("ODOO_DB"))?
            .set_override_option("odoo.username", env("ODOO_USERNAME"))?
            .set_override_option("odoo.api_key", env("ODOO_API_KEY"))?
            .set_override_option("server.host", env("HOST"))?
            .set_override_option("server.port", port)?
            .set_override_option("transport", transport)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for OdooConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            database: String::new(),
            username: String::new(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_location_id: shared::DEFAULT_LOCATION_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_is_an_alias_for_http() {
        let transport: Transport = serde_json::from_str("\"sse\"").unwrap();
        assert_eq!(transport, Transport::Http);
        let transport: Transport = serde_json::from_str("\"stdio\"").unwrap();
        assert_eq!(transport, Transport::Stdio);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.odoo.timeout_secs, 60);
        assert_eq!(config.analysis.default_location_id, 8);
        assert_eq!(config.transport, Transport::Stdio);
    }
}
