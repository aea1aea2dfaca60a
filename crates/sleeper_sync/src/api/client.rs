//! Sleeper API client creation and request execution.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::error::{AttemptError, FetchError};
use super::rate_limit::ApiRateLimiter;
use crate::config::SyncConfig;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpError, HttpRequest, HttpTransport};
use crate::retry::{RetryConfig, with_retry};
use crate::sync::ProgressCallback;

/// Default Sleeper API base URL (versioned).
pub const SLEEPER_API_BASE: &str = "https://api.sleeper.app/v1";

/// The status the sync routines act on. Everything else is reported.
const STATUS_OK: u16 = 200;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// A response from the Sleeper API that was not a rate-limit signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Request path relative to the base URL.
    pub path: String,
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Whether the status is 200, the only status the sync routines store.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Rate-limited Sleeper API client.
///
/// Cloning is cheap and clones share the transport and rate limiter.
#[derive(Clone)]
pub struct SleeperClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    rate_limiter: Option<ApiRateLimiter>,
    retry: RetryConfig,
}

impl SleeperClient {
    /// Create a client from the run configuration using a reqwest transport.
    pub fn new(config: &SyncConfig) -> Result<Self, HttpError> {
        let transport = ReqwestTransport::with_timeout(config.http_timeout)?;

        Ok(Self::new_with_transport(
            &config.base_url,
            Arc::new(transport),
            Some(ApiRateLimiter::per_minute(config.requests_per_minute)),
            config.retry.clone(),
        ))
    }

    pub fn new_with_transport(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        rate_limiter: Option<ApiRateLimiter>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter,
            retry,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` relative to the base URL.
    ///
    /// With `retry` set, 429 responses and transport failures are retried with
    /// exponential backoff up to the configured bound. Any other status is
    /// returned as an [`ApiResponse`] for the caller to inspect.
    pub async fn fetch(&self, path: &str, retry: bool) -> Result<ApiResponse, FetchError> {
        self.fetch_with_progress(path, retry, None).await
    }

    /// Same as [`fetch`](Self::fetch), reporting backoffs to `on_progress`.
    pub async fn fetch_with_progress(
        &self,
        path: &str,
        retry: bool,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<ApiResponse, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(path, retry, "GET");

        let (result, attempts) = if retry {
            let this = self;
            let url = url.as_str();
            with_retry(
                move || this.send_once(url, path),
                self.retry.clone(),
                AttemptError::is_retryable,
                |e: &AttemptError| e.to_string(),
                path,
                on_progress,
            )
            .await
        } else {
            (self.send_once(&url, path).await, 1)
        };

        let response = result.map_err(|e| e.into_fetch_error(path, attempts))?;
        tracing::debug!(path, status = response.status, attempts, "Response received");
        Ok(response)
    }

    async fn send_once(&self, url: &str, path: &str) -> Result<ApiResponse, AttemptError> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let request = HttpRequest {
            url: url.to_string(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), "sleeper-sync".to_string()),
            ],
        };

        let response = self
            .transport
            .get(request)
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        if response.status == STATUS_TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }

        Ok(ApiResponse {
            path: path.to_string(),
            status: response.status,
            body: response.body,
        })
    }
}

impl std::fmt::Debug for SleeperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SleeperClient")
            .field("base_url", &self.base_url)
            .field("rate_limited", &self.rate_limiter.is_some())
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::http::MockTransport;

    const BASE: &str = "https://api.test/v1";

    fn fast_retry() -> RetryConfig {
        RetryConfig::new(Duration::from_millis(1), Duration::from_millis(2), 2).with_jitter(false)
    }

    fn client(transport: &MockTransport) -> SleeperClient {
        SleeperClient::new_with_transport(BASE, Arc::new(transport.clone()), None, fast_retry())
    }

    #[test]
    fn new_with_transport_trims_trailing_slash() {
        let transport = MockTransport::new();
        let client = SleeperClient::new_with_transport(
            "https://api.test/v1//",
            Arc::new(transport),
            None,
            RetryConfig::default(),
        );
        assert_eq!(client.base_url(), BASE);
    }

    #[test]
    fn new_builds_from_default_config() {
        let client = SleeperClient::new(&SyncConfig::default()).expect("client should build");
        assert_eq!(client.base_url(), SLEEPER_API_BASE);
    }

    #[tokio::test]
    async fn fetch_returns_ok_response_with_json_body() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/state/nfl"),
            200,
            &serde_json::json!({"season": "2024", "week": 5}),
        );

        let response = client(&transport)
            .fetch("/state/nfl", true)
            .await
            .expect("fetch should succeed");

        assert!(response.is_ok());
        assert_eq!(response.path, "/state/nfl");
        let body: serde_json::Value = response.json().expect("json body");
        assert_eq!(body["week"], 5);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(
            requests[0]
                .headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case("accept") && v == "application/json")
        );
    }

    #[tokio::test]
    async fn fetch_retries_rate_limit_then_succeeds() {
        let transport = MockTransport::new();
        let url = format!("{BASE}/players/nfl/trending/add");
        transport.push_json(&url, 429, &serde_json::json!({}));
        transport.push_json(&url, 200, &serde_json::json!([]));

        let response = client(&transport)
            .fetch("/players/nfl/trending/add", true)
            .await
            .expect("second attempt should succeed");

        assert_eq!(response.status, 200);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn fetch_surfaces_rate_limited_after_exhausting_retries() {
        let transport = MockTransport::new();
        let url = format!("{BASE}/players/nfl");
        for _ in 0..3 {
            transport.push_json(&url, 429, &serde_json::json!({}));
        }

        let err = client(&transport)
            .fetch("/players/nfl", true)
            .await
            .expect_err("should be rate limited");

        assert!(err.is_rate_limited());
        assert_eq!(err.attempts(), 3);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn fetch_without_retry_makes_single_attempt() {
        let transport = MockTransport::new();
        transport.push_json(format!("{BASE}/league/1"), 429, &serde_json::json!({}));

        let err = client(&transport)
            .fetch("/league/1", false)
            .await
            .expect_err("429 without retry is an error");

        assert!(matches!(err, FetchError::RateLimited { attempts: 1, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn fetch_retries_transport_errors() {
        let transport = MockTransport::new();
        let url = format!("{BASE}/user/42");
        transport.push_transport_error(&url, "connection reset");
        transport.push_json(&url, 200, &serde_json::json!({"user_id": "42"}));

        let response = client(&transport)
            .fetch("/user/42", true)
            .await
            .expect("retry should recover");
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn fetch_surfaces_transport_error_without_retry() {
        let transport = MockTransport::new();
        transport.push_transport_error(format!("{BASE}/user/42"), "connection refused");

        let err = client(&transport)
            .fetch("/user/42", false)
            .await
            .expect_err("transport failure");

        match err {
            FetchError::Transport { message, .. } => assert!(message.contains("connection refused")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_returns_other_statuses_without_retrying() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/league/404"),
            404,
            &serde_json::json!({"error": "not found"}),
        );

        let response = client(&transport)
            .fetch("/league/404", true)
            .await
            .expect("non-429 statuses are returned, not raised");

        assert_eq!(response.status, 404);
        assert!(!response.is_ok());
        assert!(response.text().contains("not found"));
        assert_eq!(transport.requests().len(), 1);
    }
}
