//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use arena::{db::DatabaseConfig, game::GameCatalog, scheduler::SchedulerConfig};
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_DATA_DIR: &str = "data";
const MIN_ADMIN_TOKEN_LEN: usize = 16;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP bind address
    pub bind: SocketAddr,
    /// Where tournaments and users are persisted
    pub store: StoreBackend,
    /// Auto-tournament scheduler settings
    pub scheduler: SchedulerConfig,
    /// Whether the scheduler runs at all
    pub auto_tournaments_enabled: bool,
    /// Bearer token guarding admin routes; admin routes are open when unset
    pub admin_token: Option<String>,
    /// Prometheus exporter bind address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Document store selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSON documents in a data directory
    File { data_dir: PathBuf },
    /// JSONB rows in PostgreSQL
    Postgres(DatabaseConfig),
}

/// Values given on the command line, taking precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub store: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed or a required one is missing
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(overrides: Overrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_or(&lookup, "SERVER_BIND", || {
                DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: "default bind address is malformed".to_string(),
                })
            })?,
        };

        let backend = overrides
            .store
            .or_else(|| lookup("STORE_BACKEND"))
            .unwrap_or_else(|| "file".to_string());

        let store = match backend.to_lowercase().as_str() {
            "file" => StoreBackend::File {
                data_dir: overrides
                    .data_dir
                    .or_else(|| lookup("DATA_DIR").map(PathBuf::from))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            },
            "postgres" => {
                let database_url = overrides
                    .database_url
                    .or_else(|| lookup("DATABASE_URL"))
                    .ok_or_else(|| ConfigError::MissingRequired {
                        var: "DATABASE_URL".to_string(),
                        hint: "Required when STORE_BACKEND=postgres".to_string(),
                    })?;
                let defaults = DatabaseConfig::development();
                StoreBackend::Postgres(DatabaseConfig {
                    database_url,
                    max_connections: parse_env_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
                    min_connections: parse_env_or(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections)?,
                    connection_timeout_secs: parse_env_or(
                        &lookup,
                        "DB_CONNECTION_TIMEOUT",
                        defaults.connection_timeout_secs,
                    )?,
                    idle_timeout_secs: parse_env_or(&lookup, "DB_IDLE_TIMEOUT", defaults.idle_timeout_secs)?,
                    max_lifetime_secs: parse_env_or(&lookup, "DB_MAX_LIFETIME", defaults.max_lifetime_secs)?,
                })
            }
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND".to_string(),
                    reason: format!("expected 'file' or 'postgres', got '{other}'"),
                });
            }
        };

        let defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            games: lookup("AUTO_TOURNAMENT_GAMES")
                .map(|raw| split_list(&raw).map(str::to_string).collect())
                .unwrap_or(defaults.games),
            sizes: match lookup("AUTO_TOURNAMENT_SIZES") {
                Some(raw) => split_list(&raw)
                    .map(|s| {
                        s.parse().map_err(|_| ConfigError::Invalid {
                            var: "AUTO_TOURNAMENT_SIZES".to_string(),
                            reason: format!("'{s}' is not a number"),
                        })
                    })
                    .collect::<Result<_, _>>()?,
                None => defaults.sizes,
            },
            cleanup_interval: Duration::from_secs(parse_env_or(
                &lookup,
                "AUTO_TOURNAMENT_CLEANUP_INTERVAL_SECS",
                defaults.cleanup_interval.as_secs(),
            )?),
            retention: Duration::from_secs(
                parse_env_or(
                    &lookup,
                    "AUTO_TOURNAMENT_RETENTION_HOURS",
                    defaults.retention.as_secs() / 3600,
                )? * 3600,
            ),
            replacement_delay: Duration::from_millis(parse_env_or(
                &lookup,
                "AUTO_TOURNAMENT_REPLACEMENT_DELAY_MS",
                defaults.replacement_delay.as_millis() as u64,
            )?),
        };

        let metrics_bind = lookup("METRICS_BIND")
            .map(|raw| {
                raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{raw}' is not a socket address"),
                })
            })
            .transpose()?;

        Ok(ServerConfig {
            bind,
            store,
            scheduler,
            auto_tournaments_enabled: parse_env_or(&lookup, "AUTO_TOURNAMENTS_ENABLED", true)?,
            admin_token: lookup("ADMIN_TOKEN").filter(|t| !t.is_empty()),
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = self.scheduler.validate() {
            return Err(ConfigError::Invalid {
                var: "AUTO_TOURNAMENT_*".to_string(),
                reason: e.to_string(),
            });
        }

        let catalog = GameCatalog::default();
        if let Some(game) = self.scheduler.games.iter().find(|g| !catalog.contains(g)) {
            return Err(ConfigError::Invalid {
                var: "AUTO_TOURNAMENT_GAMES".to_string(),
                reason: format!("unknown game '{game}'"),
            });
        }

        if let Some(token) = &self.admin_token
            && token.len() < MIN_ADMIN_TOKEN_LEN
        {
            return Err(ConfigError::Invalid {
                var: "ADMIN_TOKEN".to_string(),
                reason: format!("Must be at least {MIN_ADMIN_TOKEN_LEN} characters"),
            });
        }

        if let StoreBackend::Postgres(db) = &self.store
            && db.min_connections > db.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!("Cannot exceed DB_MAX_CONNECTIONS ({})", db.max_connections),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: "Must differ from SERVER_BIND".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: impl FnOnce() -> Result<T, ConfigError>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("cannot parse '{raw}'"),
        }),
        None => default(),
    }
}

/// Parse a variable, falling back to `default` when it is unset
fn parse_env_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    parse_or(lookup, key, || Ok(default))
}
