//! Shared sync types and constants.

use std::fmt;

use super::error::SyncError;

/// Maximum backoff delay in milliseconds when rate limited.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum retries for a single API request.
pub const MAX_FETCH_RETRIES: u32 = 5;

/// A synchronized resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    League,
    Rosters,
    Users,
    SeasonState,
    Matchups,
    Players,
    Trending,
}

impl Resource {
    /// Stable lowercase name, used in logs and as the freshness key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::League => "league",
            Self::Rosters => "rosters",
            Self::Users => "users",
            Self::SeasonState => "season_state",
            Self::Matchups => "matchups",
            Self::Players => "players",
            Self::Trending => "trending",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a routine that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Documents were upserted.
    Stored { count: usize },
    /// Documents were fetched but, in fetch-only mode, not written.
    Fetched { count: usize },
    /// The freshness gate was closed; nothing was fetched.
    Skipped,
}

impl SyncOutcome {
    /// Number of documents written, or fetched in fetch-only mode.
    pub fn count(&self) -> usize {
        match self {
            Self::Stored { count } | Self::Fetched { count } => *count,
            Self::Skipped => 0,
        }
    }
}

/// One routine's result within a full run.
#[derive(Debug)]
pub struct ResourceReport {
    pub league_id: String,
    pub resource: Resource,
    pub result: Result<SyncOutcome, SyncError>,
}

impl ResourceReport {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}
