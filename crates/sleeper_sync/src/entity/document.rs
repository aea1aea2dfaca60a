//! Document entity - one row per stored document, across all collections.
//!
//! The store is collection-oriented: a document's identity within its
//! collection is its natural key, kept in canonical form in `natural_key`.
//! The payload itself is free-form JSON.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Document model - a JSON object stored under a natural key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Collection name (e.g., "rosters", "matchups").
    pub collection: String,

    /// Canonical JSON of the key fields, sorted by field name
    /// (e.g., `{"league_id":"784","owner_id":"12"}`).
    #[sea_orm(column_type = "Text")]
    pub natural_key: String,

    /// The document body, always a JSON object.
    #[sea_orm(column_type = "Json")]
    pub body: serde_json::Value,

    /// Per-collection write counter; the highest value is the most recently
    /// inserted or updated document.
    pub revision: i64,

    /// When the document was first inserted.
    pub created_at: DateTimeWithTimeZone,

    /// When the document was last written.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
