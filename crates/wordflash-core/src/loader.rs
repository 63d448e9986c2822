//! Shared input handling for vocabulary and quiz files
//!
//! Both loaders read YAML, accept a few loosely defined shapes and hand back
//! typed records. Everything they have in common lives here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while loading an input file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unsupported document shape: {0}")]
    UnsupportedShape(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Parse YAML text into a generic document tree
pub fn parse_yaml(text: &str) -> LoadResult<Value> {
    Ok(serde_yaml::from_str(text)?)
}

/// Read an input file as UTF-8 text
pub fn read_input(path: &Path) -> LoadResult<String> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Human name of a YAML node kind, for error messages
pub(crate) fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "an empty document",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Strip YAML tags so `!foo {..}` is handled like `{..}`
pub(crate) fn untagged(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untagged(&tagged.value),
        other => other,
    }
}

/// Stringify a scalar node
///
/// Null becomes the empty string. Lists and mappings are not text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match untagged(value) {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// An optional text field: missing, null and empty all read as absent
pub(crate) fn optional_text(map: &Mapping, key: &str) -> Option<String> {
    map.get(key)
        .and_then(scalar_text)
        .filter(|s| !s.is_empty())
}
