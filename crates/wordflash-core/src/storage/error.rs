//! Storage error handling
//!
//! Provides typed errors for document store operations with descriptive
//! messages and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::DocId;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create the directory holding the store file
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Backing file exists but is not a readable store
    #[error("Store at '{path}' is corrupted or unreadable: {details}")]
    CorruptStore { path: PathBuf, details: String },

    /// A stored record could not be decoded into the expected shape
    #[error("Invalid record {id} in table '{table}': {details}")]
    InvalidRecord {
        table: String,
        id: DocId,
        details: String,
    },

    /// Update targeted a document id that does not exist
    #[error("Document {id} not found in table '{table}'")]
    DocumentNotFound { table: String, id: DocId },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind.
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            _ => StorageError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Classify a SQLite error raised while opening the store at `path`
    pub fn from_open(error: rusqlite::Error, path: PathBuf) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, msg) => match failure.code {
                rusqlite::ErrorCode::NotADatabase | rusqlite::ErrorCode::DatabaseCorrupt => {
                    StorageError::CorruptStore {
                        path,
                        details: msg.clone().unwrap_or_else(|| failure.to_string()),
                    }
                }
                rusqlite::ErrorCode::PermissionDenied
                | rusqlite::ErrorCode::ReadOnly
                | rusqlite::ErrorCode::CannotOpen => StorageError::PermissionDenied {
                    path,
                    source: io::Error::new(io::ErrorKind::PermissionDenied, error.to_string()),
                },
                _ => StorageError::Database(error),
            },
            _ => StorageError::Database(error),
        }
    }

    /// Check if this error is recoverable by the user
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::PermissionDenied { .. }
                | StorageError::CorruptStore { .. }
                | StorageError::CreateDirectory { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions, or point --db at a writable location.")
            }
            StorageError::CorruptStore { .. } => {
                Some("Move the damaged file aside and reload your vocabulary files to rebuild the store.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
