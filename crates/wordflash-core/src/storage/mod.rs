//! Storage layer
//!
//! A small document store: named tables of JSON records with sequential ids,
//! persisted in a single SQLite file, queried with composable predicates.

pub mod document_store;
pub mod error;
pub mod query;
pub mod schema;

pub use document_store::{Document, DocumentStore};
pub use error::{StorageError, StorageResult};
pub use query::Query;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};

/// Store-assigned record identity
pub type DocId = i64;

/// Field map of a stored record
pub type Record = serde_json::Map<String, serde_json::Value>;
