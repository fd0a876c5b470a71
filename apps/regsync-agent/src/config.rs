//! Agent configuration from environment variables.

/// Configuration for the regsync agent entry point.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Database connection URL (durable identifier cache and
    /// snapshots).
    pub database_url: String,

    /// Maximum database connections.
    pub max_connections: u32,

    /// Whether CRM writes are live. Defaults to false: dry run is the
    /// safe mode.
    pub live_writes: bool,

    /// Whether destructive CRM writes (delete) are enabled.
    pub destructive_writes: bool,

    /// Worker-pool width for the parallel create phase.
    pub concurrency: usize,
}

impl AgentConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// This allows tests to supply variables without mutating
    /// process-global environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let database_url =
            reader("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL".into()))?;

        let max_connections = reader("MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidValue("MAX_CONNECTIONS".into(), e.to_string()))?;

        let live_writes = reader("LIVE_WRITES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let destructive_writes = reader("DESTRUCTIVE_WRITES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let concurrency = reader("CONCURRENCY")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidValue("CONCURRENCY".into(), e.to_string()))?;

        Ok(Self {
            database_url,
            max_connections,
            live_writes,
            destructive_writes,
            concurrency,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
