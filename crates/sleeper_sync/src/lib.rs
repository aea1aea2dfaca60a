//! Sleeper Sync - incremental sync of a Sleeper fantasy league into a local store.
//!
//! This library fetches league metadata, rosters, users, matchups, the player
//! catalog, and trending players from the read-only Sleeper API and upserts
//! them by natural key into a document store, so repeated runs converge
//! rather than duplicate.
//!
//! # Features
//!
//! - `sqlite` (default) / `postgres` - Database backends for [`SqlDocumentStore`].
//! - `migrate` (default) - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sleeper_sync::{LeagueSync, SleeperClient, SqlDocumentStore, SyncConfig, connect_and_migrate};
//!
//! let config = SyncConfig::default();
//! let db = connect_and_migrate("sqlite://sleeper-sync.db?mode=rwc").await?;
//! let store = Arc::new(SqlDocumentStore::new(db));
//! let client = SleeperClient::new(&config)?;
//!
//! let sync = LeagueSync::new("784462448236363776", client, store, &config);
//! for report in sync.sync_all().await {
//!     println!("{}: {:?}", report.resource, report.result);
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod freshness;
pub mod http;
pub mod retry;
pub mod store;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use api::{ApiRateLimiter, ApiResponse, FetchError, SleeperClient};
pub use config::{Collections, ConfigError, SyncConfig, league_ids};
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use freshness::{FreshnessError, FreshnessGate};
pub use store::{Document, DocumentStore, NaturalKey, SqlDocumentStore, StoreError};
pub use sync::{LeagueSync, Resource, ResourceReport, SyncError, SyncOutcome, SyncProgress};
