use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Connection pool settings for the event and role stores
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Event store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Snapshots buffered per subscriber before the producer waits
    pub subscription_buffer: usize,
    /// Delay before a failed change feed reconnects
    pub listener_retry_secs: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub log_level: String,
    pub log_format: LogFormat,
    pub environment: String,
}

/// Parse `raw` as the value of `name`, falling back to `default` when unset.
/// A value that is set but malformed is an error rather than a silent default.
fn parse_setting<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, String> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| format!("Invalid {}: {:?}", name, value)),
    }
}

fn env_setting<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    parse_setting(name, env::var(name).ok(), default)
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL is required to reach the events database")?;

        let config = Self {
            url,
            max_connections: env_setting("DATABASE_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: env_setting("DATABASE_ACQUIRE_TIMEOUT_SECS", 30)?,
            idle_timeout_secs: env_setting("DATABASE_IDLE_TIMEOUT_SECS", 600)?,
            max_lifetime_secs: env_setting("DATABASE_MAX_LIFETIME_SECS", 1800)?,
            test_before_acquire: env_setting("DATABASE_TEST_BEFORE_ACQUIRE", true)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject pool settings the event engine cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err("DATABASE_URL must be a postgres:// connection string".to_string());
        }

        // Each live subscription pins one connection to LISTEN on
        if self.max_connections < 2 {
            return Err(format!(
                "DATABASE_MAX_CONNECTIONS must be at least 2 so the change listener \
                 does not starve event reads, got {}",
                self.max_connections
            ));
        }

        if self.acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        if self.max_lifetime_secs < self.idle_timeout_secs {
            return Err(format!(
                "DATABASE_MAX_LIFETIME_SECS ({}) must not be shorter than DATABASE_IDLE_TIMEOUT_SECS ({})",
                self.max_lifetime_secs, self.idle_timeout_secs
            ));
        }

        Ok(())
    }

    /// How long a store call waits for a free connection
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Connections are recycled after this, listeners included
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/sports_central".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl StoreConfig {
    /// Create store config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let subscription_buffer = env_setting("SUBSCRIPTION_BUFFER", 16usize)?;
        let listener_retry_secs = env_setting("LISTENER_RETRY_SECS", 5u64)?;

        if subscription_buffer == 0 {
            return Err("SUBSCRIPTION_BUFFER must be greater than 0".to_string());
        }

        Ok(Self {
            subscription_buffer,
            listener_retry_secs,
        })
    }

    /// Get listener retry delay as Duration
    pub fn listener_retry(&self) -> Duration {
        Duration::from_secs(self.listener_retry_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            subscription_buffer: 16,
            listener_retry_secs: 5,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;
        let store = StoreConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .to_lowercase()
            .as_str()
        {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(format!(
                    "Invalid LOG_FORMAT: {}. Must be one of: [\"pretty\", \"json\"]",
                    other
                ))
            }
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        Ok(Self {
            database,
            store,
            log_level: log_level.to_lowercase(),
            log_format,
            environment: environment.to_lowercase(),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Get database URL (convenience method)
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            store: StoreConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            environment: "development".to_string(),
        }
    }
}
