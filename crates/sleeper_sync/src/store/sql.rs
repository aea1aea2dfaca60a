//! [`DocumentStore`] backed by a sea-orm connection.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use super::document::{
    Document, NaturalKey, initial_body, into_document, matches, merge_fields, project,
};
use super::errors::Result;
use super::{DocumentStore, UpdateOutcome};
use crate::entity::document::{ActiveModel, Column, Entity as DocumentEntity, Model};

/// Stores every collection in the `documents` table.
#[derive(Debug)]
pub struct SqlDocumentStore {
    db: DatabaseConnection,
}

impl SqlDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        Ok(DocumentEntity::find()
            .filter(Column::Collection.eq(collection))
            .count(&self.db)
            .await?)
    }
}

async fn find_model<C: ConnectionTrait>(
    conn: &C,
    collection: &str,
    key: &NaturalKey,
) -> Result<Option<Model>> {
    Ok(DocumentEntity::find()
        .filter(Column::Collection.eq(collection))
        .filter(Column::NaturalKey.eq(key.canonical()))
        .one(conn)
        .await?)
}

async fn latest_model<C: ConnectionTrait>(conn: &C, collection: &str) -> Result<Option<Model>> {
    Ok(DocumentEntity::find()
        .filter(Column::Collection.eq(collection))
        .order_by_desc(Column::Revision)
        .one(conn)
        .await?)
}

#[async_trait]
impl DocumentStore for SqlDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        key: &NaturalKey,
        projection: Option<&[&str]>,
    ) -> Result<Option<Document>> {
        let Some(model) = find_model(&self.db, collection, key).await? else {
            return Ok(None);
        };

        let document = into_document(collection, model.body)?;
        Ok(Some(match projection {
            Some(fields) => project(document, fields),
            None => document,
        }))
    }

    async fn update_one(
        &self,
        collection: &str,
        key: &NaturalKey,
        set: &Document,
        upsert: bool,
    ) -> Result<UpdateOutcome> {
        // Match and write under one transaction so concurrent writers
        // cannot interleave between the lookup and the write.
        let txn = self.db.begin().await?;

        let existing = find_model(&txn, collection, key).await?;
        if existing.is_none() && !upsert {
            txn.rollback().await?;
            return Ok(UpdateOutcome::NotMatched);
        }

        let revision = latest_model(&txn, collection)
            .await?
            .map_or(1, |latest| latest.revision + 1);
        let now = Utc::now().fixed_offset();

        let outcome = match existing {
            Some(model) => {
                let mut body = into_document(collection, model.body.clone())?;
                merge_fields(&mut body, key, set);

                let mut active: ActiveModel = model.into();
                active.body = Set(Value::Object(body));
                active.revision = Set(revision);
                active.updated_at = Set(now);
                active.update(&txn).await?;
                UpdateOutcome::Updated
            }
            None => {
                let active = ActiveModel {
                    id: Set(Uuid::new_v4()),
                    collection: Set(collection.to_string()),
                    natural_key: Set(key.canonical()),
                    body: Set(Value::Object(initial_body(key, set))),
                    revision: Set(revision),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active.insert(&txn).await?;
                UpdateOutcome::Inserted
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Option<&Document>,
    ) -> Result<Vec<Value>> {
        let models = DocumentEntity::find()
            .filter(Column::Collection.eq(collection))
            .order_by_asc(Column::Revision)
            .all(&self.db)
            .await?;

        let mut values: Vec<Value> = Vec::new();
        for model in models {
            let document = into_document(collection, model.body)?;
            if filter.is_some_and(|filter| !matches(&document, filter)) {
                continue;
            }
            match document.get(field) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }
            }
        }
        Ok(values)
    }

    async fn last(&self, collection: &str) -> Result<Option<Document>> {
        latest_model(&self.db, collection)
            .await?
            .map(|model| into_document(collection, model.body))
            .transpose()
    }
}
