//! Per-league sync engine.
//!
//! [`LeagueSync`] runs one routine per resource. Every routine follows the
//! same shape: fetch, require status 200, transform the payload into
//! documents, upsert them by natural key. Routines that depend on other
//! resources (users on rosters, matchups on season state) sync the
//! dependency first and read the derived context back from the store.
//!
//! # Rate Limiting
//!
//! All routines share the [`SleeperClient`] they were built with, and with it
//! a single request budget. Requests are issued sequentially.

mod league;
mod players;
mod season;
mod trending;

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use super::error::{SyncError, excerpt};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{Resource, ResourceReport, SyncOutcome};
use crate::api::{ApiResponse, SleeperClient};
use crate::config::SyncConfig;
use crate::freshness::FreshnessGate;
use crate::store::{Document, DocumentStore, NaturalKey, upsert_many};

pub use players::write_snapshot;
pub use trending::Direction;

/// Synchronizes the resources of one league into a [`DocumentStore`].
pub struct LeagueSync<'a> {
    league_id: String,
    client: SleeperClient,
    store: Arc<dyn DocumentStore>,
    gate: FreshnessGate,
    config: &'a SyncConfig,
    on_progress: Option<&'a ProgressCallback>,
    store_documents: bool,
}

impl<'a> LeagueSync<'a> {
    pub fn new(
        league_id: impl Into<String>,
        client: SleeperClient,
        store: Arc<dyn DocumentStore>,
        config: &'a SyncConfig,
    ) -> Self {
        let gate = FreshnessGate::new(store.clone(), config.collections.last_fetch_time.clone());
        Self {
            league_id: league_id.into(),
            client,
            store,
            gate,
            config,
            on_progress: None,
            store_documents: true,
        }
    }

    /// With `false`, routines fetch and validate but write no documents.
    ///
    /// Derived context (roster owners, season state) then comes from the
    /// fetched responses rather than the store. The player snapshot file and
    /// the freshness gate are still updated.
    #[must_use]
    pub fn with_store(mut self, store_documents: bool) -> Self {
        self.store_documents = store_documents;
        self
    }

    /// Report progress to `on_progress`.
    #[must_use]
    pub fn with_progress(mut self, on_progress: &'a ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn stores_documents(&self) -> bool {
        self.store_documents
    }

    pub fn league_id(&self) -> &str {
        &self.league_id
    }

    /// The freshness gate used for the player catalog.
    pub fn freshness(&self) -> &FreshnessGate {
        &self.gate
    }

    /// Run every routine in dependency order.
    ///
    /// Season state is refreshed as part of matchups. A failing routine is
    /// reported and the remaining routines still run.
    pub async fn sync_all(&self) -> Vec<ResourceReport> {
        let mut reports = Vec::with_capacity(6);

        reports.push(self.report(Resource::League, self.sync_league().await));
        reports.push(self.report(Resource::Rosters, self.sync_rosters().await));
        reports.push(self.report(Resource::Users, self.sync_users().await));
        reports.push(self.report(Resource::Matchups, self.sync_matchups(None).await));
        reports.push(self.report(Resource::Players, self.sync_players().await));
        reports.push(self.report(Resource::Trending, self.sync_trending().await));

        let failed = reports.iter().filter(|r| r.is_failure()).count();
        tracing::info!(
            league_id = %self.league_id,
            routines = reports.len(),
            failed,
            "League sync finished"
        );
        reports
    }

    fn report(
        &self,
        resource: Resource,
        result: Result<SyncOutcome, SyncError>,
    ) -> ResourceReport {
        ResourceReport {
            league_id: self.league_id.clone(),
            resource,
            result,
        }
    }

    /// Run one routine body, reporting its start and result.
    async fn track<F>(&self, resource: Resource, routine: F) -> Result<SyncOutcome, SyncError>
    where
        F: Future<Output = Result<SyncOutcome, SyncError>>,
    {
        emit(
            self.on_progress,
            SyncProgress::ResourceStarted {
                league_id: self.league_id.clone(),
                resource,
            },
        );

        let result = routine.await;
        match &result {
            Ok(SyncOutcome::Stored { count }) => {
                tracing::info!(league_id = %self.league_id, %resource, count, "Synced");
                emit(
                    self.on_progress,
                    SyncProgress::Stored {
                        league_id: self.league_id.clone(),
                        resource,
                        count: *count,
                    },
                );
            }
            Ok(SyncOutcome::Fetched { count }) => {
                tracing::info!(league_id = %self.league_id, %resource, count, "Fetched, not stored");
                emit(
                    self.on_progress,
                    SyncProgress::NotStored {
                        league_id: self.league_id.clone(),
                        resource,
                        count: *count,
                    },
                );
            }
            Ok(SyncOutcome::Skipped) => {
                tracing::info!(league_id = %self.league_id, %resource, "Skipped, data is fresh");
                emit(
                    self.on_progress,
                    SyncProgress::Skipped {
                        league_id: self.league_id.clone(),
                        resource,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(league_id = %self.league_id, %resource, error = %e, "Sync failed");
                emit(
                    self.on_progress,
                    SyncProgress::ResourceFailed {
                        league_id: self.league_id.clone(),
                        resource,
                        error: e.to_string(),
                    },
                );
            }
        }
        result
    }

    /// Upsert `records` keyed by `key_fn`, or in fetch-only mode just
    /// check that every record has its key. Returns the record count.
    async fn persist<F>(
        &self,
        collection: &str,
        key_fn: F,
        records: Vec<Document>,
    ) -> Result<usize, SyncError>
    where
        F: Fn(&Document) -> crate::store::Result<NaturalKey>,
    {
        if !self.store_documents {
            for record in &records {
                key_fn(record)?;
            }
            return Ok(records.len());
        }
        Ok(upsert_many(self.store.as_ref(), collection, key_fn, records).await?)
    }

    /// The outcome for `count` documents under the current mode.
    fn outcome(&self, count: usize) -> SyncOutcome {
        if self.store_documents {
            SyncOutcome::Stored { count }
        } else {
            SyncOutcome::Fetched { count }
        }
    }

    /// GET `path` with retries and require status 200.
    async fn fetch_ok(&self, resource: Resource, path: &str) -> Result<ApiResponse, SyncError> {
        let response = self
            .client
            .fetch_with_progress(path, true, self.on_progress)
            .await?;

        emit(
            self.on_progress,
            SyncProgress::Fetched {
                path: path.to_string(),
                status: response.status,
                bytes: response.body.len(),
            },
        );

        if !response.is_ok() {
            return Err(SyncError::Upstream {
                resource,
                path: path.to_string(),
                status: response.status,
                body: excerpt(&response.text()),
            });
        }
        Ok(response)
    }

    /// GET a single JSON object.
    async fn fetch_document(&self, resource: Resource, path: &str) -> Result<Document, SyncError> {
        let response = self.fetch_ok(resource, path).await?;
        let value: Value = response
            .json()
            .map_err(|e| SyncError::decode(resource, e.to_string()))?;
        match value {
            Value::Object(document) => Ok(document),
            other => Err(SyncError::decode(
                resource,
                format!("expected an object, got {other}"),
            )),
        }
    }

    /// GET a JSON array of objects. A `null` body is an empty list.
    async fn fetch_documents(
        &self,
        resource: Resource,
        path: &str,
    ) -> Result<Vec<Document>, SyncError> {
        let response = self.fetch_ok(resource, path).await?;
        let value: Value = response
            .json()
            .map_err(|e| SyncError::decode(resource, e.to_string()))?;
        documents_from(resource, value)
    }
}

fn documents_from(resource: Resource, value: Value) -> Result<Vec<Document>, SyncError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(document) => Ok(document),
                other => Err(SyncError::decode(
                    resource,
                    format!("item {i} is not an object: {other}"),
                )),
            })
            .collect(),
        other => Err(SyncError::decode(
            resource,
            format!("expected an array, got {other}"),
        )),
    }
}

impl std::fmt::Debug for LeagueSync<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeagueSync")
            .field("league_id", &self.league_id)
            .field("client", &self.client)
            .field("store_documents", &self.store_documents)
            .finish()
    }
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use sea_orm::DbErr;
    use serde_json::Value;

    use crate::api::SleeperClient;
    use crate::config::SyncConfig;
    use crate::connect_and_migrate;
    use crate::http::MockTransport;
    use crate::retry::RetryConfig;
    use crate::store::{
        Document, DocumentStore, NaturalKey, Result, SqlDocumentStore, StoreError, UpdateOutcome,
    };

    pub const BASE: &str = "https://api.test/v1";
    pub const LEAGUE: &str = "784";

    pub fn url(path: &str) -> String {
        format!("{BASE}{path}")
    }

    pub fn test_config(snapshot_dir: &std::path::Path) -> SyncConfig {
        SyncConfig {
            base_url: BASE.to_string(),
            player_snapshot_path: snapshot_dir.join("players.json"),
            retry: RetryConfig::new(Duration::from_millis(1), Duration::from_millis(2), 1)
                .with_jitter(false),
            ..SyncConfig::default()
        }
    }

    pub fn client(transport: &MockTransport, config: &SyncConfig) -> SleeperClient {
        SleeperClient::new_with_transport(
            &config.base_url,
            Arc::new(transport.clone()),
            None,
            config.retry.clone(),
        )
    }

    pub async fn sql_store() -> Arc<SqlDocumentStore> {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");
        Arc::new(SqlDocumentStore::new(db))
    }

    /// Delegates to a SQL store but fails every write to one collection.
    pub struct FailingStore {
        pub inner: Arc<SqlDocumentStore>,
        pub failing_collection: &'static str,
    }

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn find_one(
            &self,
            collection: &str,
            key: &NaturalKey,
            projection: Option<&[&str]>,
        ) -> Result<Option<Document>> {
            self.inner.find_one(collection, key, projection).await
        }

        async fn update_one(
            &self,
            collection: &str,
            key: &NaturalKey,
            set: &Document,
            upsert: bool,
        ) -> Result<UpdateOutcome> {
            if collection == self.failing_collection {
                return Err(StoreError::Database(DbErr::Custom(
                    "disk full".to_string(),
                )));
            }
            self.inner.update_one(collection, key, set, upsert).await
        }

        async fn distinct(
            &self,
            collection: &str,
            field: &str,
            filter: Option<&Document>,
        ) -> Result<Vec<Value>> {
            self.inner.distinct(collection, field, filter).await
        }

        async fn last(&self, collection: &str) -> Result<Option<Document>> {
            self.inner.last(collection).await
        }
    }
}
