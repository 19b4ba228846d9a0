//! Configuration management for Horizon API.
//!
//! Configuration is loaded from defaults, an optional `config/horizon`
//! file, and environment variables, in that order. A handful of
//! well-known environment variables (secrets, gateway key) override
//! whatever the file said.

use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment: "development" | "production".
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// AI mentor gateway configuration.
    #[serde(default)]
    pub mentor: MentorConfig,
}

fn default_environment() -> String {
    "development".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_secs: 60,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding the SQLite database file.
    pub data_dir: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret for bearer-token validation. Requests are rejected
    /// when unset, so the service cannot run accidentally open.
    pub jwt_secret: Option<String>,
}

/// AI mentor gateway configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorConfig {
    /// Gateway base URL.
    pub base_url: String,
    /// Bearer key for the gateway.
    pub api_key: Option<String>,
    /// Model identifier passed through to the gateway.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and config files.
    ///
    /// Sources, in order:
    /// 1. Default values
    /// 2. Config file (`config/horizon.{yaml,toml,json}`)
    /// 3. Environment variables (`HORIZON__` prefix, `__` separator)
    /// 4. Well-known overrides (`JWT_SECRET`, `MENTOR_API_KEY`, ...)
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            // Start with defaults
            .set_default("environment", "development")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.timeout_secs", 60)?
            .set_default("database.data_dir", "./data")?
            // Add config file if it exists
            .add_source(config::File::with_name("config/horizon").required(false))
            // Override with environment variables
            .add_source(
                config::Environment::with_prefix("HORIZON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize().unwrap_or_default();

        // Well-known environment overrides
        if let Ok(env) = std::env::var("ENVIRONMENT") {
            app_config.environment = env;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            app_config.auth.jwt_secret = Some(secret);
        }
        if let Ok(key) = std::env::var("MENTOR_API_KEY") {
            app_config.mentor.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("MENTOR_BASE_URL") {
            app_config.mentor.base_url = url;
        }
        if let Ok(dir) = std::env::var("HORIZON_DATA_DIR") {
            app_config.database.data_dir = dir;
        }

        Ok(app_config)
    }

    /// Whether the service runs in production mode.
    ///
    /// Demo seed/reset endpoints are refused in production.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
