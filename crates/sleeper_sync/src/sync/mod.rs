//! League synchronization.
//!
//! # Module Structure
//!
//! - `types` - Core types: `Resource`, `SyncOutcome`, `ResourceReport`, constants
//! - `progress` - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - [`LeagueSync`], one routine per resource plus `sync_all()`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sleeper_sync::{SleeperClient, SqlDocumentStore, SyncConfig, sync::LeagueSync};
//!
//! let config = SyncConfig::default();
//! let client = SleeperClient::new(&config)?;
//! let store = Arc::new(SqlDocumentStore::new(db));
//! let sync = LeagueSync::new("784462448236363776", client, store, &config);
//! let reports = sync.sync_all().await;
//! ```

pub mod engine;
mod error;
mod progress;
mod types;

pub use engine::LeagueSync;
pub use error::SyncError;
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use types::{
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_FETCH_RETRIES, Resource, ResourceReport, SyncOutcome,
};
