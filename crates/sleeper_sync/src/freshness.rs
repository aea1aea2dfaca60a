//! Minimum-interval gating for expensive endpoints.
//!
//! The last fetch time of each gated resource lives in the store itself
//! (one document per resource), so the gate survives restarts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::store::{Document, DocumentStore, NaturalKey, StoreError};

const RESOURCE_FIELD: &str = "resource";
const FETCHED_AT_FIELD: &str = "fetched_at";

/// Errors from freshness bookkeeping.
#[derive(Debug, Error)]
pub enum FreshnessError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored timestamp could not be parsed.
    #[error("Invalid last fetch time for {resource}: {value}")]
    InvalidTimestamp { resource: String, value: String },

    /// The interval is too large to represent as a calendar duration.
    #[error("Freshness interval out of range: {0:?}")]
    IntervalOutOfRange(Duration),
}

pub type Result<T> = std::result::Result<T, FreshnessError>;

/// Decides whether a resource may be fetched again.
#[derive(Clone)]
pub struct FreshnessGate {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl FreshnessGate {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    fn key(resource: &str) -> NaturalKey {
        NaturalKey::single(RESOURCE_FIELD, resource)
    }

    /// When `resource` was last marked as fetched, if ever.
    pub async fn last_fetched(&self, resource: &str) -> Result<Option<DateTime<Utc>>> {
        let found = self
            .store
            .find_one(
                &self.collection,
                &Self::key(resource),
                Some(&[FETCHED_AT_FIELD]),
            )
            .await?;

        let Some(document) = found else {
            return Ok(None);
        };

        match document.get(FETCHED_AT_FIELD) {
            Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
                .map(|at| Some(at.with_timezone(&Utc)))
                .map_err(|_| FreshnessError::InvalidTimestamp {
                    resource: resource.to_string(),
                    value: raw.clone(),
                }),
            Some(other) => Err(FreshnessError::InvalidTimestamp {
                resource: resource.to_string(),
                value: other.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Record `at` as the last fetch time of `resource`.
    pub async fn mark_fetched(&self, resource: &str, at: DateTime<Utc>) -> Result<()> {
        let mut set = Document::new();
        set.insert(FETCHED_AT_FIELD.to_string(), Value::String(at.to_rfc3339()));
        self.store
            .update_one(&self.collection, &Self::key(resource), &set, true)
            .await?;
        tracing::debug!(resource, fetched_at = %at, "Marked fetch time");
        Ok(())
    }

    /// Whether at least `min_interval` has elapsed since the last fetch.
    pub async fn should_fetch(&self, resource: &str, min_interval: Duration) -> Result<bool> {
        self.should_fetch_at(resource, min_interval, Utc::now()).await
    }

    /// [`should_fetch`](Self::should_fetch) evaluated at `now`.
    ///
    /// A resource with no recorded fetch is seeded with a timestamp twice the
    /// interval in the past, so the first check always opens.
    pub async fn should_fetch_at(
        &self,
        resource: &str,
        min_interval: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let interval = chrono::Duration::from_std(min_interval)
            .map_err(|_| FreshnessError::IntervalOutOfRange(min_interval))?;

        let last = match self.last_fetched(resource).await? {
            Some(last) => last,
            None => {
                let seeded = now
                    .checked_sub_signed(interval)
                    .and_then(|t| t.checked_sub_signed(interval))
                    .ok_or(FreshnessError::IntervalOutOfRange(min_interval))?;
                self.mark_fetched(resource, seeded).await?;
                seeded
            }
        };

        let open = now - last >= interval;
        tracing::debug!(resource, last_fetched = %last, open, "Freshness check");
        Ok(open)
    }

    /// Check the gate and, when open, immediately mark `resource` as fetched now.
    ///
    /// Marking before the fetch means a crash mid-fetch delays the next
    /// attempt by one interval rather than allowing a retry storm.
    pub async fn try_open(&self, resource: &str, min_interval: Duration) -> Result<bool> {
        self.try_open_at(resource, min_interval, Utc::now()).await
    }

    pub async fn try_open_at(
        &self,
        resource: &str,
        min_interval: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if !self.should_fetch_at(resource, min_interval, now).await? {
            return Ok(false);
        }
        self.mark_fetched(resource, now).await?;
        Ok(true)
    }
}

impl std::fmt::Debug for FreshnessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshnessGate")
            .field("collection", &self.collection)
            .finish()
    }
}
