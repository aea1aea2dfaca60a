//! Progress reporting for the CLI.
//!
//! Sync progress is rendered as structured log lines; what is shown is
//! controlled with `RUST_LOG` like any other log output.

use sleeper_sync::sync::{ProgressCallback, SyncProgress};

/// Logging reporter using tracing for structured output.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    /// Wrap the reporter in a callback the sync engine can call.
    pub fn into_callback(self) -> ProgressCallback {
        Box::new(move |event| self.handle(event))
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::ResourceStarted {
                league_id,
                resource,
            } => {
                tracing::debug!(league_id = %league_id, %resource, "Starting");
            }

            SyncProgress::Fetched {
                path,
                status,
                bytes,
            } => {
                tracing::debug!(path = %path, status, bytes, "Fetched");
            }

            SyncProgress::Stored {
                league_id,
                resource,
                count,
            } => {
                tracing::info!(league_id = %league_id, %resource, count, "Stored");
            }

            SyncProgress::NotStored {
                league_id,
                resource,
                count,
            } => {
                tracing::info!(league_id = %league_id, %resource, count, "Fetched (not stored)");
            }

            SyncProgress::Skipped {
                league_id,
                resource,
            } => {
                tracing::info!(league_id = %league_id, %resource, "Skipped (fresh)");
            }

            SyncProgress::ResourceFailed {
                league_id,
                resource,
                error,
            } => {
                tracing::error!(league_id = %league_id, %resource, error = %error, "Failed");
            }

            SyncProgress::SnapshotWritten { path, players } => {
                tracing::info!(path = %path.display(), players, "Wrote player snapshot");
            }

            SyncProgress::RateLimitBackoff {
                path,
                retry_after_ms,
                attempt,
            } => {
                tracing::warn!(path = %path, retry_after_ms, attempt, "Rate limited, backing off");
            }

            SyncProgress::Warning { message } => {
                tracing::warn!("{}", message);
            }

            _ => {
                tracing::trace!("Unhandled progress event");
            }
        }
    }
}
