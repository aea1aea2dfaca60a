//! Collection-oriented document storage.
//!
//! Every synced resource is stored as a JSON [`Document`] in a named
//! collection, identified by a [`NaturalKey`]. [`DocumentStore`] is the
//! boundary the sync layer writes through; [`SqlDocumentStore`] implements it
//! on top of sea-orm.

mod document;
mod errors;
mod sql;
pub mod upsert;

use async_trait::async_trait;
use serde_json::Value;

pub use document::{Document, NaturalKey, into_document, merge_fields, project};
pub use errors::{Result, StoreError};
pub use sql::SqlDocumentStore;
pub use upsert::{upsert, upsert_many};

/// What a single [`DocumentStore::update_one`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No document matched and a new one was created.
    Inserted,
    /// An existing document was updated in place.
    Updated,
    /// No document matched and `upsert` was false.
    NotMatched,
}

/// A store of JSON documents grouped into named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find the document matching `key`, optionally restricted to `projection`.
    async fn find_one(
        &self,
        collection: &str,
        key: &NaturalKey,
        projection: Option<&[&str]>,
    ) -> Result<Option<Document>>;

    /// Atomically set the fields of `set` on the document matching `key`.
    ///
    /// Key fields are never overwritten. With `upsert`, a missing document is
    /// created from the key fields plus `set`.
    async fn update_one(
        &self,
        collection: &str,
        key: &NaturalKey,
        set: &Document,
        upsert: bool,
    ) -> Result<UpdateOutcome>;

    /// Distinct non-null values of `field` among documents matching `filter`.
    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Option<&Document>,
    ) -> Result<Vec<Value>>;

    /// The most recently inserted or updated document of a collection.
    async fn last(&self, collection: &str) -> Result<Option<Document>>;
}
