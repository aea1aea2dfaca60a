//! Immutable run configuration.
//!
//! A [`SyncConfig`] is built once at startup (the CLI layers files and
//! environment variables on top of [`SyncConfig::default`]) and passed by
//! reference into every component constructor.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::api::{DEFAULT_REQUESTS_PER_MINUTE, SLEEPER_API_BASE};
use crate::retry::RetryConfig;

/// Minimum time between two player catalog downloads.
pub const PLAYER_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

/// Default HTTP client timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors detected while validating configuration. Fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No league identifier was configured.
    #[error(
        "No league id configured. Set league.ids in the config file or the SLEEPER_LEAGUE_IDS \
         environment variable (comma-separated for multiple leagues)"
    )]
    MissingLeagueId,

    /// The base URL is not an http(s) URL.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// The request budget must allow at least one request per minute.
    #[error("requests_per_minute must be greater than zero")]
    InvalidRateLimit,

    /// The player refresh interval does not fit in a duration.
    #[error("players.refresh_hours is out of range: {0}")]
    RefreshIntervalOutOfRange(u64),

    /// A collection name was left empty.
    #[error("Collection name for {0} must not be empty")]
    EmptyCollectionName(&'static str),
}

/// Collection names used for each resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub league: String,
    pub rosters: String,
    pub users: String,
    pub season_state: String,
    pub matchups: String,
    pub players: String,
    pub trending: String,
    pub last_fetch_time: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            league: "league".to_string(),
            rosters: "rosters".to_string(),
            users: "users".to_string(),
            season_state: "season_state".to_string(),
            matchups: "matchups".to_string(),
            players: "players".to_string(),
            trending: "trending".to_string(),
            last_fetch_time: "last_fetch_time".to_string(),
        }
    }
}

impl Collections {
    fn named(&self) -> [(&'static str, &str); 8] {
        [
            ("league", self.league.as_str()),
            ("rosters", self.rosters.as_str()),
            ("users", self.users.as_str()),
            ("season_state", self.season_state.as_str()),
            ("matchups", self.matchups.as_str()),
            ("players", self.players.as_str()),
            ("trending", self.trending.as_str()),
            ("last_fetch_time", self.last_fetch_time.as_str()),
        ]
    }
}

/// Configuration shared by every component for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// API base URL including the version segment.
    pub base_url: String,
    /// Collection names.
    pub collections: Collections,
    /// Where the full player catalog snapshot is written.
    pub player_snapshot_path: PathBuf,
    /// Minimum interval between player catalog downloads.
    pub player_refresh_interval: Duration,
    /// Proactive request budget.
    pub requests_per_minute: u32,
    /// HTTP client timeout per request.
    pub http_timeout: Duration,
    /// Backoff policy for 429 and transport failures.
    pub retry: RetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: SLEEPER_API_BASE.to_string(),
            collections: Collections::default(),
            player_snapshot_path: PathBuf::from("players.json"),
            player_refresh_interval: PLAYER_REFRESH_INTERVAL,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Check invariants that would otherwise surface mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.requests_per_minute == 0 {
            return Err(ConfigError::InvalidRateLimit);
        }
        for (resource, name) in self.collections.named() {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyCollectionName(resource));
            }
        }
        Ok(())
    }
}

/// Normalize configured league ids: trim, drop empties, de-duplicate in order.
///
/// Returns [`ConfigError::MissingLeagueId`] when nothing usable remains.
pub fn league_ids<I, S>(raw: I) -> Result<Vec<String>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ids: Vec<String> = Vec::new();
    for id in raw {
        for part in id.as_ref().split(',') {
            let part = part.trim();
            if !part.is_empty() && !ids.iter().any(|existing| existing == part) {
                ids.push(part.to_string());
            }
        }
    }

    if ids.is_empty() {
        Err(ConfigError::MissingLeagueId)
    } else {
        Ok(ids)
    }
}
