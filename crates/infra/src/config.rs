//! Configuration loading and representation.
//!
//! Everything comes from environment variables. Unset variables fall back to
//! local-development defaults.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a port number, got {value:?}")]
    InvalidPort { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub app_host: String,
    pub app_port: u16,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_sslmode: String,
    /// Full connection string; wins over the `db_*` parts when set.
    pub database_url: Option<String>,
    /// `true` selects Postgres, otherwise the in-memory store is used.
    pub use_persistent_stores: bool,
    /// Insert the demo catalog, orders and audit trail at startup, each only
    /// into an empty table.
    pub seed_catalog: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_host: "0.0.0.0".to_string(),
            app_port: 8080,
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_user: "user".to_string(),
            db_password: "root".to_string(),
            db_name: "furniture".to_string(),
            db_sslmode: "disable".to_string(),
            database_url: None,
            use_persistent_stores: false,
            seed_catalog: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            app_host: var("APP_HOST").unwrap_or(defaults.app_host),
            app_port: parse_port("APP_PORT", var("APP_PORT"), defaults.app_port)?,
            db_host: var("DB_HOST").unwrap_or(defaults.db_host),
            db_port: parse_port("DB_PORT", var("DB_PORT"), defaults.db_port)?,
            db_user: var("DB_USER").unwrap_or(defaults.db_user),
            db_password: var("DB_PASSWORD").unwrap_or(defaults.db_password),
            db_name: var("DB_NAME").unwrap_or(defaults.db_name),
            db_sslmode: var("DB_SSLMODE").unwrap_or(defaults.db_sslmode),
            database_url: var("DATABASE_URL"),
            use_persistent_stores: var("USE_PERSISTENT_STORES")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.use_persistent_stores),
            seed_catalog: var("SEED_CATALOG")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.seed_catalog),
        })
    }

    /// `host:port` to bind the HTTP listener on.
    pub fn app_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode={}",
                self.db_user,
                self.db_password,
                self.db_host,
                self.db_port,
                self.db_name,
                self.db_sslmode
            ),
        }
    }
}

fn parse_port(name: &'static str, value: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort { name, value }),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
