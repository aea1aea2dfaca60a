//! Trending adds and drops.

use chrono::{NaiveDate, Utc};
use serde_json::Value;

use super::LeagueSync;
use crate::api::endpoints;
use crate::store::{Document, NaturalKey};
use crate::sync::error::SyncError;
use crate::sync::types::{Resource, SyncOutcome};

const TRENDING_KEY: &[&str] = &["player_id", "day", "direction"];

/// Which trending list an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Add,
    Drop,
}

impl Direction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Drop => "drop",
        }
    }

    const fn path(&self) -> &'static str {
        match self {
            Self::Add => endpoints::TRENDING_ADD,
            Self::Drop => endpoints::TRENDING_DROP,
        }
    }
}

impl LeagueSync<'_> {
    /// Fetch today's (UTC) trending adds and drops.
    pub async fn sync_trending(&self) -> Result<SyncOutcome, SyncError> {
        self.sync_trending_on(Utc::now().date_naive()).await
    }

    /// Fetch trending adds and drops, tagging entries with `day`.
    ///
    /// The two lists are fetched independently; a failure in one is reported
    /// as [`SyncError::Partial`] after the other has been stored.
    pub async fn sync_trending_on(&self, day: NaiveDate) -> Result<SyncOutcome, SyncError> {
        self.track(Resource::Trending, async {
            let day = day.format("%Y-%m-%d").to_string();

            let mut stored = 0usize;
            let mut failures = Vec::new();
            for direction in [Direction::Add, Direction::Drop] {
                match self.sync_trending_direction(direction, &day).await {
                    Ok(count) => stored += count,
                    Err(e) => {
                        tracing::warn!(direction = direction.as_str(), error = %e, "Trending fetch failed");
                        failures.push(format!("{}: {e}", direction.as_str()));
                    }
                }
            }

            if failures.is_empty() {
                Ok(self.outcome(stored))
            } else {
                Err(SyncError::Partial {
                    resource: Resource::Trending,
                    stored,
                    failures,
                })
            }
        })
        .await
    }

    async fn sync_trending_direction(
        &self,
        direction: Direction,
        day: &str,
    ) -> Result<usize, SyncError> {
        let mut entries = self
            .fetch_documents(Resource::Trending, direction.path())
            .await?;
        for entry in &mut entries {
            entry.insert("day".to_string(), Value::String(day.to_string()));
            entry.insert(
                "direction".to_string(),
                Value::String(direction.as_str().to_string()),
            );
        }

        let collection = &self.config.collections.trending;
        self.persist(
            collection,
            |record: &Document| NaturalKey::from_fields(collection, record, TRENDING_KEY),
            entries,
        )
        .await
    }
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::http::MockTransport;
    use crate::store::{DocumentStore, into_document};
    use crate::sync::engine::test_support::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 6).expect("valid date")
    }

    #[tokio::test]
    async fn adds_and_drops_are_tagged_separately() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        transport.push_json(
            url("/players/nfl/trending/add"),
            200,
            &json!([{"player_id": "4046", "count": 120}]),
        );
        transport.push_json(
            url("/players/nfl/trending/drop"),
            200,
            &json!([{"player_id": "4046", "count": 30}, {"player_id": "6794", "count": 2}]),
        );
        let store = sql_store().await;

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store.clone(), &config);
        let outcome = sync.sync_trending_on(day()).await.expect("trending sync");

        assert_eq!(outcome, SyncOutcome::Stored { count: 3 });
        assert_eq!(store.count("trending").await.expect("count"), 3);

        let key = NaturalKey::new(
            into_document(
                "trending",
                json!({"player_id": "4046", "day": "2024-10-06", "direction": "drop"}),
            )
            .expect("object"),
        );
        let stored = store
            .find_one("trending", &key, None)
            .await
            .expect("find")
            .expect("stored");
        assert_eq!(stored["count"], 30);
    }

    #[tokio::test]
    async fn failed_add_does_not_block_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        transport.push_json(url("/players/nfl/trending/add"), 500, &json!({}));
        transport.push_json(
            url("/players/nfl/trending/drop"),
            200,
            &json!([{"player_id": "6794", "count": 2}]),
        );
        let store = sql_store().await;

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store.clone(), &config);
        let err = sync.sync_trending_on(day()).await.expect_err("partial");

        match err {
            SyncError::Partial {
                resource,
                stored,
                failures,
            } => {
                assert_eq!(resource, Resource::Trending);
                assert_eq!(stored, 1);
                assert!(failures[0].starts_with("add:"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.count("trending").await.expect("count"), 1);
    }

    #[tokio::test]
    async fn matchup_storage_failure_does_not_affect_trending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        transport.push_json(url("/state/nfl"), 200, &json!({"season": "2024", "week": 5}));
        transport.push_json(
            url("/league/784/matchups/5"),
            200,
            &json!([{"matchup_id": 1, "roster_id": 1}]),
        );
        transport.push_json(
            url("/players/nfl/trending/add"),
            200,
            &json!([{"player_id": "4046", "count": 1}]),
        );
        transport.push_json(url("/players/nfl/trending/drop"), 200, &json!([]));

        let inner = sql_store().await;
        let store: Arc<dyn DocumentStore> = Arc::new(FailingStore {
            inner: inner.clone(),
            failing_collection: "matchups",
        });

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store, &config);
        let matchups = sync.sync_matchups(None).await;
        let trending = sync.sync_trending_on(day()).await;

        assert!(matches!(matchups, Err(SyncError::Store(_))));
        assert_eq!(trending.expect("trending stores"), SyncOutcome::Stored { count: 1 });
        assert_eq!(inner.count("trending").await.expect("count"), 1);
        assert_eq!(inner.count("matchups").await.expect("count"), 0);
    }
}
