//! Progress reporting types for sync operations.
//!
//! Routines report what they are doing through an optional callback so the
//! caller can render or log it; the library never prints.

use std::path::PathBuf;

use super::types::Resource;

/// Progress events emitted during sync operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A routine started for a league.
    ResourceStarted {
        league_id: String,
        resource: Resource,
    },

    /// A response was received.
    Fetched {
        /// Request path relative to the API base URL.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Body size in bytes.
        bytes: usize,
    },

    /// A routine finished and stored documents.
    Stored {
        league_id: String,
        resource: Resource,
        /// Number of documents upserted.
        count: usize,
    },

    /// A routine finished in fetch-only mode; nothing was written.
    NotStored {
        league_id: String,
        resource: Resource,
        /// Number of documents fetched.
        count: usize,
    },

    /// A routine did nothing because its freshness gate was closed.
    Skipped {
        league_id: String,
        resource: Resource,
    },

    /// A routine failed.
    ResourceFailed {
        league_id: String,
        resource: Resource,
        /// Error message.
        error: String,
    },

    /// The player catalog snapshot was written.
    SnapshotWritten {
        path: PathBuf,
        /// Number of players in the snapshot.
        players: usize,
    },

    /// Rate limited (or transport failure), backing off before retry.
    RateLimitBackoff {
        /// Request path being retried.
        path: String,
        /// Time to wait before retry (ms).
        retry_after_ms: u64,
        /// Current attempt number.
        attempt: u32,
    },

    /// Warning message (non-fatal).
    Warning {
        /// Warning message.
        message: String,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
