//! SeaORM entity definitions for the sleeper-sync database schema.

pub mod document;
pub mod prelude;
