//! Application configuration loaded from environment variables.

use serde::Deserialize;
use url::Url;

use crate::error::Result;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Interface the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    // === Database Configuration ===
    /// PostgreSQL connection URL. Without one, products live in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum pooled database connections.
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    /// Create the products table on startup when missing.
    #[serde(default = "default_true")]
    pub database_auto_migrate: bool,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3006
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            database_max_connections: default_max_connections(),
            database_auto_migrate: default_true(),
            rust_log: default_log_level(),
            verbose: false,
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from explicit `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("HOST must not be empty".to_string());
        }

        if self.database_max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be at least 1".to_string());
        }

        if let Some(raw) = &self.database_url {
            let url = Url::parse(raw).map_err(|e| format!("DATABASE_URL is invalid: {e}"))?;
            if !matches!(url.scheme(), "postgres" | "postgresql") {
                return Err(format!(
                    "DATABASE_URL must use the postgres scheme, got {}",
                    url.scheme()
                ));
            }
        }

        Ok(())
    }

    /// Address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Database URL with the password masked, safe for logs.
    pub fn redacted_database_url(&self) -> Option<String> {
        let raw = self.database_url.as_ref()?;
        match Url::parse(raw) {
            Ok(mut url) => {
                if url.password().is_some() {
                    // Only fails for cannot-be-a-base URLs, which have no password
                    let _ = url.set_password(Some("****"));
                }
                Some(url.to_string())
            }
            Err(_) => Some("<unparseable>".to_string()),
        }
    }
}
