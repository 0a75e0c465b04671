//! SQLite-backed document record store.
//!
//! One row per processed document. Records are append-only: the store
//! exposes no update or delete, `processed_at` is assigned exactly once at
//! insertion, and a single-row INSERT keeps the all-fields-or-none
//! invariant even if the process dies mid-operation.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;
use tracing::{debug, info};

use finsight_core::{value_text, DocumentRecord, FieldMap, FinsightError, NewDocument};

/// Durable store of [`DocumentRecord`] rows.
///
/// Holds a single `rusqlite::Connection`; callers that share a store across
/// tasks wrap it in a mutex, which serializes writers. Reads hand out owned
/// copies, never references into the store.
pub struct DocumentStore {
    conn: Connection,
}

impl DocumentStore {
    /// Open or create the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FinsightError> {
        let conn = Connection::open(path.as_ref()).map_err(open_err)?;
        let store = Self { conn };
        store.init_schema()?;
        info!(path = %path.as_ref().display(), "Document store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, FinsightError> {
        let conn = Connection::open_in_memory().map_err(open_err)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), FinsightError> {
        self.conn
            .execute_batch(
                "PRAGMA journal_mode=WAL;
                 CREATE TABLE IF NOT EXISTS documents (
                     id               INTEGER PRIMARY KEY AUTOINCREMENT,
                     filename         TEXT NOT NULL,
                     processed_at     TEXT NOT NULL,
                     extracted_fields TEXT NOT NULL,
                     raw_summary      TEXT
                 );
                 CREATE INDEX IF NOT EXISTS idx_documents_processed_at
                     ON documents(processed_at);",
            )
            .map_err(storage_err)
    }

    /// Insert a new record, assigning its id and `processed_at`.
    ///
    /// The filename must be non-empty. Non-string field values are coerced
    /// to text at this boundary, so everything downstream (export, chat
    /// context) sees a flat string mapping. The insert is a single row and
    /// therefore atomic; the record is visible to reads as soon as this
    /// returns.
    pub fn insert(&self, doc: &NewDocument) -> Result<i64, FinsightError> {
        if doc.filename.trim().is_empty() {
            return Err(FinsightError::Storage(
                "cannot store a record with an empty filename".into(),
            ));
        }

        let fields = coerce_fields(&doc.extracted_fields);
        let fields_json = serde_json::to_string(&fields)
            .map_err(|e| FinsightError::Storage(format!("failed to encode fields: {e}")))?;
        let processed_at = Utc::now();

        self.conn
            .execute(
                "INSERT INTO documents (filename, processed_at, extracted_fields, raw_summary)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    doc.filename,
                    processed_at.to_rfc3339(),
                    fields_json,
                    doc.raw_summary,
                ],
            )
            .map_err(storage_err)?;

        let id = self.conn.last_insert_rowid();
        debug!(id, filename = %doc.filename, "Stored document record");
        Ok(id)
    }

    /// All records, ordered by `processed_at` ascending, ties broken by id.
    pub fn list_all(&self) -> Result<Vec<DocumentRecord>, FinsightError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, filename, processed_at, extracted_fields, raw_summary
                 FROM documents ORDER BY processed_at ASC, id ASC",
            )
            .map_err(storage_err)?;

        let rows: Vec<RawRow> = stmt
            .query_map([], row_to_raw)
            .map_err(storage_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(storage_err)?;

        rows.into_iter().map(parse_row).collect()
    }

    /// Fetch one record by id.
    pub fn get(&self, id: i64) -> Result<DocumentRecord, FinsightError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, filename, processed_at, extracted_fields, raw_summary
                 FROM documents WHERE id = ?1",
            )
            .map_err(storage_err)?;

        match stmt.query_row(params![id], row_to_raw) {
            Ok(raw) => parse_row(raw),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(FinsightError::NotFound(id)),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Count all stored records.
    pub fn count(&self) -> Result<usize, FinsightError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(storage_err)
    }
}

type RawRow = (i64, String, String, String, Option<String>);

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn parse_row((id, filename, processed_at, fields_json, raw_summary): RawRow) -> Result<DocumentRecord, FinsightError> {
    let processed_at = DateTime::parse_from_rfc3339(&processed_at)
        .map_err(|e| FinsightError::Storage(format!("record {id} has an invalid timestamp: {e}")))?
        .with_timezone(&Utc);
    let extracted_fields: FieldMap = serde_json::from_str(&fields_json)
        .map_err(|e| FinsightError::Storage(format!("record {id} has an invalid field payload: {e}")))?;
    Ok(DocumentRecord {
        id,
        filename,
        processed_at,
        extracted_fields,
        raw_summary,
    })
}

/// Stringify every field value, preserving the map's insertion order.
fn coerce_fields(fields: &FieldMap) -> FieldMap {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value_text(value))))
        .collect()
}

fn open_err(e: rusqlite::Error) -> FinsightError {
    FinsightError::Storage(format!("failed to open database: {e}"))
}

fn storage_err(e: rusqlite::Error) -> FinsightError {
    FinsightError::Storage(e.to_string())
}
