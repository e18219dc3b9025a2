//! Read-only vector index over SQLite.
//!
//! The index is one physical table holding every logical table's rows:
//!
//! ```sql
//! records(id INTEGER PRIMARY KEY, table_name TEXT NOT NULL,
//!         record TEXT NOT NULL, vector BLOB NOT NULL)
//! ```
//!
//! `record` is a JSON object with the row's metadata and `vector` is the
//! embedding as little-endian `f32`s. Search is an exhaustive scan ranked by
//! squared Euclidean distance, which is exact and fast enough for the few
//! thousand rows a channel catalog holds.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::{Connection, OpenFlags, params};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::filter::Predicate;
use crate::error::SearchError;

/// Default index location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "channel_summary_vectordb/vectors.db";

/// Result count when a query sets no limit.
pub const DEFAULT_LIMIT: usize = 10;

/// DDL of the index, for producers and test fixtures.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY,
    table_name TEXT NOT NULL,
    record TEXT NOT NULL,
    vector BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_table ON records(table_name);
";

/// One row's metadata, a JSON object with permissive accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl TryFrom<Value> for Record {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

impl Record {
    /// Raw field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field rendered as text; `None` when missing or `null`.
    #[must_use]
    pub fn display(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Field rendered as text, empty when absent.
    #[must_use]
    pub fn text(&self, field: &str) -> String {
        self.display(field).unwrap_or_default()
    }

    /// Field rendered as text, `default` when absent.
    #[must_use]
    pub fn text_or(&self, field: &str, default: &str) -> String {
        self.display(field).unwrap_or_else(|| default.to_string())
    }

    /// Integer field; non-numeric or absent values read as 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn int(&self, field: &str) -> i64 {
        match self.0.get(field) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        }
    }

    /// Whether the field holds a non-empty, non-zero value.
    #[must_use]
    pub fn has_value(&self, field: &str) -> bool {
        match self.0.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }
}

/// A search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Row id in the index.
    pub id: i64,
    /// Row metadata.
    pub record: Record,
    /// Squared L2 distance to the query vector (lower is closer).
    pub distance: f32,
}

/// Encodes a vector as the index stores it.
#[must_use]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decodes a stored vector; `None` if the blob length is not a multiple of 4.
#[must_use]
pub fn decode_vector(blob: &[u8]) -> Option<Vec<f32>> {
    if !blob.len().is_multiple_of(4) {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Handle to an index file.
pub struct VectorDb {
    conn: Connection,
    path: PathBuf,
}

impl VectorDb {
    /// Opens an existing index read-only.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Open`] if the path is missing, is a directory,
    /// or is not a SQLite file with a `records` table.
    pub fn open(path: &Path) -> Result<Self, SearchError> {
        let open_error = |message: String| SearchError::Open {
            path: path.display().to_string(),
            message,
        };

        if path.is_dir() {
            return Err(open_error(
                "is a directory; expected a SQLite index file with a `records` table".to_string(),
            ));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| open_error(e.to_string()))?;

        let has_records: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'records')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| open_error(e.to_string()))?;
        if !has_records {
            return Err(open_error("no `records` table".to_string()));
        }

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path the index was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the logical tables present, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Sql`] if the index cannot be read.
    pub fn list_tables(&self) -> Result<Vec<String>, SearchError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT table_name FROM records ORDER BY table_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Opens a logical table.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::TableNotFound`] when no row belongs to `name`.
    pub fn open_table(&self, name: &str) -> Result<Table<'_>, SearchError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM records WHERE table_name = ?1)",
            params![name],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(SearchError::TableNotFound {
                name: name.to_string(),
            });
        }
        Ok(Table {
            conn: &self.conn,
            name: name.to_string(),
        })
    }
}

/// One logical table of the index.
pub struct Table<'db> {
    conn: &'db Connection,
    name: String,
}

impl<'db> Table<'db> {
    /// Starts a nearest-neighbour query.
    #[must_use]
    pub fn search(&self, vector: Vec<f32>) -> Query<'_, 'db> {
        Query {
            table: self,
            vector,
            filter: None,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Every record of the table, in row order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CorruptRecord`] for undecodable metadata.
    pub fn rows(&self) -> Result<Vec<Record>, SearchError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, record FROM records WHERE table_name = ?1 ORDER BY id")?;
        let mut rows = stmt.query(params![self.name])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let raw: String = row.get(1)?;
            records.push(self.decode_record(id, &raw)?);
        }
        Ok(records)
    }

    fn decode_record(&self, id: i64, raw: &str) -> Result<Record, SearchError> {
        serde_json::from_str(raw).map_err(|e| SearchError::CorruptRecord {
            table: self.name.clone(),
            id,
            message: e.to_string(),
        })
    }
}

/// Builder for a nearest-neighbour query.
pub struct Query<'t, 'db> {
    table: &'t Table<'db>,
    vector: Vec<f32>,
    filter: Option<Predicate>,
    limit: usize,
}

impl Query<'_, '_> {
    /// Restricts results to records matching `predicate`.
    ///
    /// Calling this twice requires both predicates to hold.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Runs the query, closest first.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CorruptRecord`] or
    /// [`SearchError::DimensionMismatch`] for a bad candidate row, and
    /// [`SearchError::Sql`] if the scan fails.
    pub fn to_list(self) -> Result<Vec<Hit>, SearchError> {
        let started = Instant::now();
        let mut stmt = self
            .table
            .conn
            .prepare("SELECT id, record, vector FROM records WHERE table_name = ?1 ORDER BY id")?;
        let mut rows = stmt.query(params![self.table.name])?;

        let mut scanned = 0usize;
        let mut hits = Vec::new();
        while let Some(row) = rows.next()? {
            scanned += 1;
            let id: i64 = row.get(0)?;
            let raw: String = row.get(1)?;
            let record = self.table.decode_record(id, &raw)?;
            if self.filter.as_ref().is_some_and(|f| !f.matches(&record)) {
                continue;
            }

            let blob: Vec<u8> = row.get(2)?;
            let stored = decode_vector(&blob).ok_or_else(|| SearchError::CorruptRecord {
                table: self.table.name.clone(),
                id,
                message: format!("vector blob of {} bytes", blob.len()),
            })?;
            if stored.len() != self.vector.len() {
                return Err(SearchError::DimensionMismatch {
                    expected: self.vector.len(),
                    actual: stored.len(),
                    id,
                });
            }

            hits.push(Hit {
                id,
                record,
                distance: squared_l2(&self.vector, &stored),
            });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(self.limit);

        debug!(
            table = self.table.name,
            scanned,
            returned = hits.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "vector search"
        );
        Ok(hits)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod fixture {
    //! Builds small index files for tests.

    use std::path::PathBuf;

    use rusqlite::{Connection, params};
    use serde_json::Value;
    use tempfile::TempDir;

    use super::{SCHEMA_SQL, encode_vector};

    /// Temporary index; the directory is removed on drop.
    pub struct FixtureDb {
        conn: Connection,
        pub path: PathBuf,
        _dir: TempDir,
    }

    impl FixtureDb {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
            let path = dir.path().join("vectors.db");
            let conn = Connection::open(&path).unwrap_or_else(|e| panic!("open: {e}"));
            conn.execute_batch(SCHEMA_SQL)
                .unwrap_or_else(|e| panic!("schema: {e}"));
            Self {
                conn,
                path,
                _dir: dir,
            }
        }

        pub fn insert(&self, table: &str, record: &Value, vector: &[f32]) -> &Self {
            self.conn
                .execute(
                    "INSERT INTO records (table_name, record, vector) VALUES (?1, ?2, ?3)",
                    params![table, record.to_string(), encode_vector(vector)],
                )
                .unwrap_or_else(|e| panic!("insert: {e}"));
            self
        }

        pub fn insert_raw(&self, table: &str, record: &str, blob: &[u8]) -> &Self {
            self.conn
                .execute(
                    "INSERT INTO records (table_name, record, vector) VALUES (?1, ?2, ?3)",
                    params![table, record, blob],
                )
                .unwrap_or_else(|e| panic!("insert: {e}"));
            self
        }
    }
}
