//! Read-only client for the Sleeper API.
//!
//! - all requests are parameterless GETs; only path segments vary
//! - no API token necessary
//! - stay under 1000 calls per minute; the API answers 429 beyond that
//!
//! [`SleeperClient`] paces requests with an [`ApiRateLimiter`] and retries
//! rate-limit and transport failures with exponential backoff. Any other
//! status is handed back to the caller untouched.

mod client;
pub mod endpoints;
mod error;
mod rate_limit;

pub use client::{ApiResponse, SLEEPER_API_BASE, SleeperClient};
pub use error::{FetchError, Result};
pub use rate_limit::{ApiRateLimiter, DEFAULT_REQUESTS_PER_MINUTE};
