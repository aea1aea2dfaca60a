//! League-scoped routines: league metadata, rosters, and roster owners.

use serde_json::Value;

use super::LeagueSync;
use crate::api::endpoints;
use crate::store::{Document, NaturalKey};
use crate::sync::error::SyncError;
use crate::sync::progress::{SyncProgress, emit};
use crate::sync::types::{Resource, SyncOutcome};

const LEAGUE_ID: &str = "league_id";
const OWNER_ID: &str = "owner_id";
const USER_ID: &str = "user_id";

const ROSTER_KEY: &[&str] = &[LEAGUE_ID, OWNER_ID];
const USER_KEY: &[&str] = &[USER_ID];

impl LeagueSync<'_> {
    /// Fetch league metadata, keyed by the configured league id.
    pub async fn sync_league(&self) -> Result<SyncOutcome, SyncError> {
        self.track(Resource::League, async {
            let path = endpoints::league(&self.league_id);
            let record = self.fetch_document(Resource::League, &path).await?;

            let key = NaturalKey::single(LEAGUE_ID, self.league_id.as_str());
            let count = self
                .persist(
                    &self.config.collections.league,
                    |_: &Document| Ok(key.clone()),
                    vec![record],
                )
                .await?;
            Ok(self.outcome(count))
        })
        .await
    }

    /// Fetch every roster of the league, keyed by (league_id, owner_id).
    pub async fn sync_rosters(&self) -> Result<SyncOutcome, SyncError> {
        self.rosters_pass().await.map(|(outcome, _)| outcome)
    }

    /// Roster routine that also hands back the fetched rosters.
    async fn rosters_pass(&self) -> Result<(SyncOutcome, Vec<Document>), SyncError> {
        let mut fetched = Vec::new();
        let outcome = self
            .track(Resource::Rosters, async {
                let path = endpoints::rosters(&self.league_id);
                let mut rosters = self.fetch_documents(Resource::Rosters, &path).await?;
                for roster in &mut rosters {
                    roster.insert(LEAGUE_ID.to_string(), Value::String(self.league_id.clone()));
                }

                let collection = &self.config.collections.rosters;
                let count = self
                    .persist(
                        collection,
                        |record: &Document| NaturalKey::from_fields(collection, record, ROSTER_KEY),
                        rosters.clone(),
                    )
                    .await?;
                fetched = rosters;
                Ok(self.outcome(count))
            })
            .await?;
        Ok((outcome, fetched))
    }

    /// Fetch the users owning this league's rosters, keyed by user_id.
    ///
    /// Rosters are synced first; their distinct owner ids drive one request
    /// per user. Owners are read from the stored rosters, or from the fetched
    /// ones in fetch-only mode. A user that cannot be fetched or stored does
    /// not stop the others, but makes the routine report [`SyncError::Partial`].
    pub async fn sync_users(&self) -> Result<SyncOutcome, SyncError> {
        let (_, rosters) = self.rosters_pass().await?;

        self.track(Resource::Users, async {
            let owners = if self.store_documents {
                let mut filter = Document::new();
                filter.insert(LEAGUE_ID.to_string(), Value::String(self.league_id.clone()));
                self.store
                    .distinct(&self.config.collections.rosters, OWNER_ID, Some(&filter))
                    .await?
            } else {
                owner_ids(&rosters)
            };

            tracing::debug!(league_id = %self.league_id, owners = owners.len(), "Fetching roster owners");

            let mut stored = 0usize;
            let mut failures = Vec::new();
            for owner in owners {
                let owner_id = id_string(&owner);
                match self.sync_user(&owner_id).await {
                    Ok(()) => stored += 1,
                    Err(e) => {
                        tracing::warn!(owner_id = %owner_id, error = %e, "Failed to sync user");
                        let message = format!("user {owner_id}: {e}");
                        emit(
                            self.on_progress,
                            SyncProgress::Warning {
                                message: message.clone(),
                            },
                        );
                        failures.push(message);
                    }
                }
            }

            if failures.is_empty() {
                Ok(self.outcome(stored))
            } else {
                Err(SyncError::Partial {
                    resource: Resource::Users,
                    stored,
                    failures,
                })
            }
        })
        .await
    }

    async fn sync_user(&self, owner_id: &str) -> Result<(), SyncError> {
        let path = endpoints::user(owner_id);
        let record = self.fetch_document(Resource::Users, &path).await?;

        let collection = &self.config.collections.users;
        self.persist(
            collection,
            |record: &Document| NaturalKey::from_fields(collection, record, USER_KEY),
            vec![record],
        )
        .await?;
        Ok(())
    }
}

/// Distinct non-null owner ids of `rosters`, in first-seen order.
fn owner_ids(rosters: &[Document]) -> Vec<Value> {
    let mut owners: Vec<Value> = Vec::new();
    for owner in rosters.iter().filter_map(|roster| roster.get(OWNER_ID)) {
        if !owner.is_null() && !owners.contains(owner) {
            owners.push(owner.clone());
        }
    }
    owners
}

/// Render an id value for use in a URL path; ids are usually strings.
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::http::MockTransport;
    use crate::store::DocumentStore;
    use crate::sync::engine::test_support::*;

    #[test]
    fn owner_ids_skip_nulls_and_duplicates() {
        let rosters: Vec<Document> = [
            json!({"owner_id": "10"}),
            json!({"owner_id": null}),
            json!({"roster_id": 3}),
            json!({"owner_id": "10"}),
            json!({"owner_id": "11"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        assert_eq!(owner_ids(&rosters), vec![json!("10"), json!("11")]);
    }

    #[test]
    fn id_string_unquotes_strings() {
        assert_eq!(id_string(&json!("123")), "123");
        assert_eq!(id_string(&json!(123)), "123");
    }

    #[tokio::test]
    async fn league_is_keyed_by_configured_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        transport.push_json(
            url("/league/784"),
            200,
            &json!({"league_id": "784", "name": "Dynasty", "season": "2024"}),
        );
        let store = sql_store().await;

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store.clone(), &config);
        let outcome = sync.sync_league().await.expect("league syncs");

        assert_eq!(outcome, SyncOutcome::Stored { count: 1 });
        let stored = store
            .find_one("league", &NaturalKey::single("league_id", "784"), None)
            .await
            .expect("find")
            .expect("stored");
        assert_eq!(stored["name"], "Dynasty");
    }

    #[tokio::test]
    async fn league_non_200_is_upstream_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        transport.push_json(url("/league/784"), 404, &json!(null));
        let store = sql_store().await;

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store.clone(), &config);
        let err = sync.sync_league().await.expect_err("404");

        assert!(matches!(err, SyncError::Upstream { status: 404, .. }));
        assert_eq!(store.count("league").await.expect("count"), 0);
    }

    #[tokio::test]
    async fn rosters_are_tagged_with_league_and_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        let rosters = json!([
            {"roster_id": 1, "owner_id": "10", "players": ["4046"]},
            {"roster_id": 2, "owner_id": "11", "players": []}
        ]);
        transport.push_json(url("/league/784/rosters"), 200, &rosters);
        transport.push_json(url("/league/784/rosters"), 200, &rosters);
        let store = sql_store().await;

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store.clone(), &config);
        sync.sync_rosters().await.expect("first");
        sync.sync_rosters().await.expect("second");

        assert_eq!(store.count("rosters").await.expect("count"), 2);
        let mut key = Document::new();
        key.insert("league_id".to_string(), json!("784"));
        key.insert("owner_id".to_string(), json!("10"));
        let stored = store
            .find_one("rosters", &NaturalKey::new(key), None)
            .await
            .expect("find")
            .expect("stored");
        assert_eq!(stored["roster_id"], 1);
        assert_eq!(stored["league_id"], "784");
    }

    #[tokio::test]
    async fn users_are_derived_from_roster_owners() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        transport.push_json(
            url("/league/784/rosters"),
            200,
            &json!([
                {"roster_id": 1, "owner_id": "10"},
                {"roster_id": 2, "owner_id": "11"},
                {"roster_id": 3, "owner_id": null}
            ]),
        );
        transport.push_json(
            url("/user/10"),
            200,
            &json!({"user_id": "10", "display_name": "alpha"}),
        );
        transport.push_json(
            url("/user/11"),
            200,
            &json!({"user_id": "11", "display_name": "beta"}),
        );
        let store = sql_store().await;

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store.clone(), &config);
        let outcome = sync.sync_users().await.expect("users sync");

        assert_eq!(outcome, SyncOutcome::Stored { count: 2 });
        assert_eq!(store.count("users").await.expect("count"), 2);
        assert!(
            !transport
                .requested_urls()
                .iter()
                .any(|u| u.ends_with("/user/null"))
        );
    }

    #[tokio::test]
    async fn one_failing_user_does_not_stop_the_others() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        transport.push_json(
            url("/league/784/rosters"),
            200,
            &json!([{"owner_id": "10"}, {"owner_id": "11"}]),
        );
        transport.push_json(url("/user/10"), 404, &json!(null));
        transport.push_json(url("/user/11"), 200, &json!({"user_id": "11"}));
        let store = sql_store().await;

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store.clone(), &config);
        let err = sync.sync_users().await.expect_err("partial");

        match err {
            SyncError::Partial {
                resource,
                stored,
                failures,
            } => {
                assert_eq!(resource, Resource::Users);
                assert_eq!(stored, 1);
                assert_eq!(failures.len(), 1);
                assert!(failures[0].contains("user 10"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.count("users").await.expect("count"), 1);
    }

    #[tokio::test]
    async fn users_fail_when_rosters_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let transport = MockTransport::new();
        transport.push_json(url("/league/784/rosters"), 503, &json!({}));
        let store = sql_store().await;

        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store, &config);
        let err = sync.sync_users().await.expect_err("rosters failed");

        assert!(matches!(
            err,
            SyncError::Upstream {
                resource: Resource::Rosters,
                status: 503,
                ..
            }
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn rosters_of_other_leagues_are_ignored_for_users() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let store = sql_store().await;

        let mut other = Document::new();
        other.insert("league_id".to_string(), json!("999"));
        other.insert("owner_id".to_string(), json!("55"));
        let key = NaturalKey::from_fields("rosters", &other, ROSTER_KEY).expect("key");
        store
            .update_one("rosters", &key, &other, true)
            .await
            .expect("seed");

        let transport = MockTransport::new();
        transport.push_json(url("/league/784/rosters"), 200, &json!([]));

        let store_dyn: Arc<dyn DocumentStore> = store.clone();
        let sync = LeagueSync::new(LEAGUE, client(&transport, &config), store_dyn, &config);
        let outcome = sync.sync_users().await.expect("no users");

        assert_eq!(outcome, SyncOutcome::Stored { count: 0 });
        assert_eq!(transport.requests().len(), 1);
    }
}
