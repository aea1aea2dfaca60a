//! Configuration file support for sleeper-sync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags (`--league`)
//! 2. Environment variables (prefixed with `SLEEPER_`, e.g., `SLEEPER_DATABASE_URL`)
//! 3. Config file (./sleeper-sync.toml, then ~/.config/sleeper-sync/config.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/sleeper-sync/sleeper-sync.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite:///var/lib/sleeper/sleeper.db?mode=rwc"  # optional
//!
//! [league]
//! ids = ["784462448236363776"]  # or SLEEPER_LEAGUE_IDS=id1,id2
//!
//! [api]
//! base_url = "https://api.sleeper.app/v1"
//! requests_per_minute = 1000
//! timeout_secs = 30
//! max_retries = 5
//!
//! [players]
//! snapshot_path = "/var/lib/sleeper/players.json"
//! refresh_hours = 24
//!
//! [collections]
//! matchups = "matchups"
//! ```
//!
//! Environment variables map `SLEEPER_<SECTION>_<KEY>` onto `section.key`, so
//! only single-word keys (`SLEEPER_DATABASE_URL`, `SLEEPER_LEAGUE_IDS`,
//! `SLEEPER_LEAGUE_ID`) can be set that way.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use sleeper_sync::api::{DEFAULT_REQUESTS_PER_MINUTE, SLEEPER_API_BASE};
use sleeper_sync::config::{DEFAULT_HTTP_TIMEOUT, PLAYER_REFRESH_INTERVAL};
use sleeper_sync::retry::RetryConfig;
use sleeper_sync::{Collections, ConfigError, SyncConfig};

const APP_NAME: &str = "sleeper-sync";
const ENV_PREFIX: &str = "SLEEPER";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Leagues to sync.
    pub league: LeagueConfig,
    /// Sleeper API access.
    pub api: ApiConfig,
    /// Player catalog handling.
    pub players: PlayersConfig,
    /// Collection name overrides.
    pub collections: CollectionsConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// League selection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    /// League ids. A single comma-separated string is also accepted, which is
    /// how `SLEEPER_LEAGUE_IDS` arrives.
    #[serde(deserialize_with = "one_or_many")]
    pub ids: Vec<String>,
    /// A single league id, as set by `SLEEPER_LEAGUE_ID`.
    pub id: Option<String>,
}

/// Sleeper API access.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: SLEEPER_API_BASE.to_string(),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            timeout_secs: DEFAULT_HTTP_TIMEOUT.as_secs(),
            max_retries: RetryConfig::default().max_retries,
        }
    }
}

/// Player catalog handling.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlayersConfig {
    /// Where the catalog snapshot is written. Defaults to the state directory.
    pub snapshot_path: Option<PathBuf>,
    /// Minimum hours between catalog downloads.
    pub refresh_hours: u64,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            refresh_hours: PLAYER_REFRESH_INTERVAL.as_secs() / 3600,
        }
    }
}

/// Collection name overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    pub league: String,
    pub rosters: String,
    pub users: String,
    pub season_state: String,
    pub matchups: String,
    pub players: String,
    pub trending: String,
    pub last_fetch_time: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        let defaults = Collections::default();
        Self {
            league: defaults.league,
            rosters: defaults.rosters,
            users: defaults.users,
            season_state: defaults.season_state,
            matchups: defaults.matchups,
            players: defaults.players,
            trending: defaults.trending,
            last_fetch_time: defaults.last_fetch_time,
        }
    }
}

impl From<&CollectionsConfig> for Collections {
    fn from(config: &CollectionsConfig) -> Self {
        Self {
            league: config.league.clone(),
            rosters: config.rosters.clone(),
            users: config.users.clone(),
            season_state: config.season_state.clone(),
            matchups: config.matchups.clone(),
            players: config.players.clone(),
            trending: config.trending.clone(),
            last_fetch_time: config.last_fetch_time.clone(),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// `SLEEPER_`-prefixed environment source. Values stay strings, so long
/// numeric league ids are never reinterpreted as numbers.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("_")
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/sleeper-sync/config.toml)
    /// 3. Local config file (./sleeper-sync.toml)
    /// 4. Environment variables with SLEEPER_ prefix
    ///
    /// A malformed file or value is an error; nothing falls back to defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from(format!("{APP_NAME}.toml"));
        if local_config.exists() {
            tracing::debug!("Loading config from ./{APP_NAME}.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(environment());

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize::<Config>()
    }

    /// Configured league ids, normalized. Fails when none are configured.
    pub fn league_ids(&self) -> Result<Vec<String>, ConfigError> {
        sleeper_sync::league_ids(self.league.ids.iter().chain(self.league.id.iter()))
    }

    /// Build the library's run configuration and validate it.
    pub fn sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let snapshot_path = self
            .players
            .snapshot_path
            .clone()
            .or_else(|| Self::default_state_dir().map(|dir| dir.join("players.json")))
            .unwrap_or_else(|| PathBuf::from("players.json"));

        let retry = RetryConfig {
            max_retries: self.api.max_retries,
            ..RetryConfig::default()
        };

        let refresh_secs = self
            .players
            .refresh_hours
            .checked_mul(3600)
            .ok_or(ConfigError::RefreshIntervalOutOfRange(self.players.refresh_hours))?;

        let config = SyncConfig {
            base_url: self.api.base_url.clone(),
            collections: Collections::from(&self.collections),
            player_snapshot_path: snapshot_path,
            player_refresh_interval: Duration::from_secs(refresh_secs),
            requests_per_minute: self.api.requests_per_minute,
            http_timeout: Duration::from_secs(self.api.timeout_secs),
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join(format!("{APP_NAME}.db"));
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/sleeper-sync` or `~/.local/state/sleeper-sync`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            // state_dir() returns None on macOS/Windows, fall back to data_dir
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
