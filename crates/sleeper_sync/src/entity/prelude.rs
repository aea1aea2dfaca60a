//! Common re-exports for convenient entity usage.

pub use super::document::{
    ActiveModel as DocumentActiveModel, Column as DocumentColumn, Entity as DocumentEntity,
    Model as DocumentModel,
};
