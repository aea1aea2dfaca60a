use thiserror::Error;

/// Errors surfaced by [`SleeperClient::fetch`](super::SleeperClient::fetch).
///
/// Non-2xx statuses other than 429 are not errors at this layer: the response
/// is returned for the caller to inspect.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body-read failure at the HTTP layer.
    #[error("Transport error for {path} after {attempts} attempt(s): {message}")]
    Transport {
        path: String,
        message: String,
        attempts: u32,
    },

    /// The API kept answering 429 Too Many Requests.
    #[error("Rate limited on {path} after {attempts} attempt(s)")]
    RateLimited { path: String, attempts: u32 },
}

impl FetchError {
    /// Check if this error is a rate limit error.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The request path that failed.
    pub fn path(&self) -> &str {
        match self {
            Self::Transport { path, .. } | Self::RateLimited { path, .. } => path,
        }
    }

    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Transport { attempts, .. } | Self::RateLimited { attempts, .. } => *attempts,
        }
    }
}

/// Outcome of a single request attempt, before retry bookkeeping.
#[derive(Debug, Error)]
pub(super) enum AttemptError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("429 Too Many Requests")]
    RateLimited,
}

impl AttemptError {
    pub(super) fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited)
    }

    pub(super) fn into_fetch_error(self, path: &str, attempts: u32) -> FetchError {
        match self {
            Self::Transport(message) => FetchError::Transport {
                path: path.to_string(),
                message,
                attempts,
            },
            Self::RateLimited => FetchError::RateLimited {
                path: path.to_string(),
                attempts,
            },
        }
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
