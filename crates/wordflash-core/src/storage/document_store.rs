//! SQLite-backed document store
//!
//! Stores named collections ("tables") of JSON records in one SQLite file.
//! Each record gets a sequential id per table, starting at 1. Every mutating
//! call runs in its own transaction and is committed before it returns, so a
//! crash never loses an acknowledged write.
//!
//! ## Layout
//!
//! - `schema_info` - schema version
//! - `documents` - `(table_name, doc_id) -> body` where `body` is a JSON object

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use serde_json::Value;
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::query::Query;
use super::schema::{init_schema, needs_init};
use super::{DocId, Record};

/// A stored record together with its id
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub fields: Record,
}

/// Persistent table-oriented record storage
pub struct DocumentStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl DocumentStore {
    /// Open or create a store at `path`
    ///
    /// Fails with `StorageError::CorruptStore` when the file exists but is
    /// not a readable store. It never falls back to an empty store.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
            }
        }

        let conn =
            Connection::open(path).map_err(|e| StorageError::from_open(e, path.to_path_buf()))?;

        let store = Self::from_connection(conn, Some(path.to_path_buf()))?;
        store.verify()?;

        debug!(path = %path.display(), "opened document store");
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        let label = path.clone().unwrap_or_else(|| PathBuf::from(":memory:"));

        let initialize = needs_init(&conn).map_err(|e| StorageError::from_open(e, label.clone()))?;
        if initialize {
            init_schema(&conn).map_err(|e| StorageError::from_open(e, label))?;
        }

        Ok(Self { conn, path })
    }

    /// Check file integrity and that every stored body decodes
    fn verify(&self) -> StorageResult<()> {
        let label = self.label();

        let status: String = self
            .conn
            .query_row("PRAGMA quick_check", [], |row| row.get(0))
            .map_err(|e| StorageError::from_open(e, label.clone()))?;
        if status != "ok" {
            return Err(StorageError::CorruptStore {
                path: label,
                details: status,
            });
        }

        let mut stmt = self
            .conn
            .prepare("SELECT table_name, doc_id, body FROM documents")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, DocId>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (table, id, body) = row?;
            decode(&table, id, &body).map_err(|e| StorageError::CorruptStore {
                path: label.clone(),
                details: e.to_string(),
            })?;
        }

        Ok(())
    }

    fn label(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(":memory:"))
    }

    /// Path of the backing file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ==================== Writes ====================

    /// Append a record and return its new id
    pub fn insert(&mut self, table: &str, record: &Record) -> StorageResult<DocId> {
        let tx = self.conn.transaction()?;
        let id = insert_record(&tx, table, record)?;
        tx.commit()?;

        debug!(table, id, "inserted document");
        Ok(id)
    }

    /// Append several records in one transaction
    pub fn insert_many(&mut self, table: &str, records: &[Record]) -> StorageResult<Vec<DocId>> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(insert_record(&tx, table, record)?);
        }
        tx.commit()?;

        debug!(table, count = ids.len(), "inserted documents");
        Ok(ids)
    }

    /// Merge `partial` into each of the given records
    ///
    /// Fields not present in `partial` are left untouched. If any id is
    /// unknown nothing is written.
    pub fn update(&mut self, table: &str, partial: &Record, ids: &[DocId]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        for &id in ids {
            let mut doc = fetch(&tx, table, id)?.ok_or_else(|| StorageError::DocumentNotFound {
                table: table.to_string(),
                id,
            })?;

            for (key, value) in partial {
                doc.fields.insert(key.clone(), value.clone());
            }

            let body = serde_json::to_string(&doc.fields)?;
            tx.execute(
                "UPDATE documents SET body = ?1 WHERE table_name = ?2 AND doc_id = ?3",
                params![body, table, id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Remove every record of a table; ids restart at 1
    pub fn truncate(&mut self, table: &str) -> StorageResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM documents WHERE table_name = ?1", params![table])?;

        debug!(table, removed, "truncated table");
        Ok(())
    }

    // ==================== Reads ====================

    /// Get a record by id
    pub fn get(&self, table: &str, id: DocId) -> StorageResult<Option<Document>> {
        fetch(&self.conn, table, id)
    }

    /// All records of a table in id order
    pub fn all(&self, table: &str) -> StorageResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, body FROM documents WHERE table_name = ?1 ORDER BY doc_id",
        )?;

        let rows = stmt.query_map(params![table], |row| {
            Ok((row.get::<_, DocId>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row?;
            docs.push(decode(table, id, &body)?);
        }

        Ok(docs)
    }

    /// Records matching `query`, in id order
    pub fn search(&self, table: &str, query: &Query) -> StorageResult<Vec<Document>> {
        Ok(self
            .all(table)?
            .into_iter()
            .filter(|doc| query.matches(&doc.fields))
            .collect())
    }

    /// Number of records in a table
    pub fn count(&self, table: &str) -> StorageResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE table_name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Names of tables that currently hold records
    pub fn table_names(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT table_name FROM documents ORDER BY table_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Release the underlying handle, reporting any error from closing it
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::Database(e))
    }
}

fn insert_record(conn: &Connection, table: &str, record: &Record) -> StorageResult<DocId> {
    let id: DocId = conn.query_row(
        "SELECT COALESCE(MAX(doc_id), 0) + 1 FROM documents WHERE table_name = ?1",
        params![table],
        |row| row.get(0),
    )?;

    let body = serde_json::to_string(record)?;
    conn.execute(
        "INSERT INTO documents (table_name, doc_id, body) VALUES (?1, ?2, ?3)",
        params![table, id, body],
    )?;

    Ok(id)
}

fn fetch(conn: &Connection, table: &str, id: DocId) -> StorageResult<Option<Document>> {
    let mut stmt =
        conn.prepare("SELECT body FROM documents WHERE table_name = ?1 AND doc_id = ?2")?;
    let mut rows = stmt.query(params![table, id])?;

    if let Some(row) = rows.next()? {
        let body: String = row.get(0)?;
        Ok(Some(decode(table, id, &body)?))
    } else {
        Ok(None)
    }
}

fn decode(table: &str, id: DocId, body: &str) -> StorageResult<Document> {
    let invalid = |details: String| StorageError::InvalidRecord {
        table: table.to_string(),
        id,
        details,
    };

    match serde_json::from_str::<Value>(body).map_err(|e| invalid(e.to_string()))? {
        Value::Object(fields) => Ok(Document { id, fields }),
        other => Err(invalid(format!("expected a JSON object, found {}", other))),
    }
}
