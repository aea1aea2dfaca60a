use std::path::PathBuf;

use thiserror::Error;

use super::types::Resource;
use crate::api::FetchError;
use crate::freshness::FreshnessError;
use crate::store::StoreError;

/// Longest response body excerpt kept in an [`SyncError::Upstream`].
pub(crate) const MAX_BODY_EXCERPT: usize = 512;

/// Errors that end a single sync routine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request could not be completed (transport failure or rate limit).
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The API answered with a status other than 200.
    #[error("{resource}: GET {path} returned status {status}: {body}")]
    Upstream {
        resource: Resource,
        path: String,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("{resource}: could not decode response: {message}")]
    Decode { resource: Resource, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Freshness(#[from] FreshnessError),

    /// Context that should have been derived from stored data is missing.
    #[error("Missing sync context: {what}")]
    MissingContext { what: &'static str },

    /// The player snapshot file could not be written.
    #[error("Failed to write snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some items of a multi-request routine failed; the rest were stored.
    #[error("{resource}: stored {stored}, {} failed: {}", failures.len(), failures.join("; "))]
    Partial {
        resource: Resource,
        stored: usize,
        failures: Vec<String>,
    },
}

impl SyncError {
    pub(crate) fn decode(resource: Resource, message: impl Into<String>) -> Self {
        Self::Decode {
            resource,
            message: message.into(),
        }
    }

    /// Whether the routine stored some of its documents before failing.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }
}

/// Cut a response body down to a loggable excerpt on a char boundary.
pub(crate) fn excerpt(body: &str) -> String {
    if body.len() <= MAX_BODY_EXCERPT {
        return body.to_string();
    }
    let mut end = MAX_BODY_EXCERPT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_mentions_status_and_path() {
        let err = SyncError::Upstream {
            resource: Resource::Players,
            path: "/players/nfl".to_string(),
            status: 503,
            body: "unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("players"));
        assert!(msg.contains("/players/nfl"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn partial_error_lists_failures() {
        let err = SyncError::Partial {
            resource: Resource::Users,
            stored: 2,
            failures: vec!["user 7: status 404".to_string(), "user 9: status 500".to_string()],
        };
        assert!(err.is_partial());
        let msg = err.to_string();
        assert!(msg.contains("stored 2, 2 failed"));
        assert!(msg.contains("user 9"));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let body = "é".repeat(MAX_BODY_EXCERPT);
        let short = excerpt(&body);
        assert!(short.ends_with("..."));
        assert!(short.len() <= MAX_BODY_EXCERPT + 3);
        assert_eq!(excerpt("ok"), "ok");
    }
}
