use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A natural-key field is absent from the record being keyed.
    #[error("Record in {collection} is missing key field '{field}'")]
    MissingKeyField { collection: String, field: String },

    /// A stored or supplied document is not usable as a JSON object.
    #[error("Invalid document in {collection}: {message}")]
    InvalidDocument { collection: String, message: String },
}

impl StoreError {
    pub fn invalid_document(collection: &str, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            collection: collection.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
