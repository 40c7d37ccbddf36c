//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Auto-posting and event dispatch settings.
    #[serde(default)]
    pub posting: PostingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL. Required for the postgres backend.
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Which storage implementation backs the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through SeaORM.
    #[default]
    Postgres,
    /// Process-local in-memory store (development and demos).
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Auto-posting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PostingConfig {
    /// Actor recorded on journals produced by auto-posting.
    #[serde(default = "default_system_actor")]
    pub system_actor: String,
    /// Dispatch transaction notifications received over HTTP on a background task.
    #[serde(default = "default_background_dispatch")]
    pub background_dispatch: bool,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            system_actor: default_system_actor(),
            background_dispatch: default_background_dispatch(),
        }
    }
}

fn default_system_actor() -> String {
    "system".to_string()
}

fn default_background_dispatch() -> bool {
    true
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// then `BLUD__*` environment variables (`BLUD__DATABASE__URL`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BLUD").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Returns the database URL, failing when the postgres backend has none.
    ///
    /// # Errors
    ///
    /// Returns an error if no URL is configured.
    pub fn database_url(&self) -> Result<&str, config::ConfigError> {
        self.database
            .url
            .as_deref()
            .ok_or_else(|| config::ConfigError::NotFound("database.url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "BLUD__DATABASE__URL",
                "BLUD__STORAGE__BACKEND",
                "BLUD__SERVER__PORT",
                "BLUD__POSTING__SYSTEM_ACTOR",
                "RUN_MODE",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.storage.backend, StorageBackend::Postgres);
                assert_eq!(config.logging.format, LogFormat::Pretty);
                assert_eq!(config.posting.system_actor, "system");
                assert!(config.posting.background_dispatch);
                assert!(config.database_url().is_err());
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                ("BLUD__DATABASE__URL", Some("postgres://blud@localhost/blud")),
                ("BLUD__STORAGE__BACKEND", Some("memory")),
                ("BLUD__SERVER__PORT", Some("9090")),
                ("BLUD__POSTING__SYSTEM_ACTOR", Some("autopost")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.storage.backend, StorageBackend::Memory);
                assert_eq!(config.posting.system_actor, "autopost");
                assert_eq!(
                    config.database_url().unwrap(),
                    "postgres://blud@localhost/blud"
                );
            },
        );
    }
}
