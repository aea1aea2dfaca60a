//! Idempotent natural-key upserts.
//!
//! Each record is written with its own atomic [`DocumentStore::update_one`];
//! nothing is batched. Replaying the same records after a crash converges on
//! the same end state.

use super::document::{Document, NaturalKey};
use super::errors::Result;
use super::{DocumentStore, UpdateOutcome};

/// Insert `record` under `key`, or merge its fields into the existing document.
pub async fn upsert<S>(
    store: &S,
    collection: &str,
    key: &NaturalKey,
    record: &Document,
) -> Result<UpdateOutcome>
where
    S: DocumentStore + ?Sized,
{
    let outcome = store.update_one(collection, key, record, true).await?;
    tracing::trace!(collection, key = %key, ?outcome, "Upserted document");
    Ok(outcome)
}

/// Upsert every record in order, keying each with `key_fn`.
///
/// Returns the number of records written. The first failure is returned
/// immediately; records before it stay written.
pub async fn upsert_many<S, F, I>(
    store: &S,
    collection: &str,
    key_fn: F,
    records: I,
) -> Result<usize>
where
    S: DocumentStore + ?Sized,
    F: Fn(&Document) -> Result<NaturalKey>,
    I: IntoIterator<Item = Document>,
{
    let mut written = 0usize;
    for record in records {
        let key = key_fn(&record)?;
        upsert(store, collection, &key, &record).await?;
        written += 1;
    }
    tracing::debug!(collection, written, "Upserted records");
    Ok(written)
}
