//! Storage layer for platebook.
//!
//! This module provides the `SQLite`-backed record collection. Plates are
//! unique through a database index, so duplicate detection happens inside
//! the insert itself rather than through a separate existence check.

pub mod connector;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{NewRecord, Record};

pub use connector::Connector;

const MEMORY_PATH: &str = ":memory:";

/// Storage engine for plate records.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set how long a statement waits on a locked database before failing.
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma cannot be applied.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// List every record in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, plate, details FROM records ORDER BY id ASC")?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Find a record by its exact plate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find(&self, plate: &str) -> Result<Option<Record>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, plate, details FROM records WHERE plate = ?1",
                [plate],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert a new record and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the plate is already stored, or a
    /// database error if the insert fails for any other reason.
    pub fn insert(&self, record: &NewRecord) -> Result<i64> {
        let now = Utc::now().to_rfc3339();

        let inserted = self.conn.execute(
            r"
            INSERT INTO records (plate, details, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ",
            params![record.plate, record.details, now],
        );

        match inserted {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                debug!("Inserted record {} with id {}", record.plate, id);
                Ok(id)
            }
            Err(err) if is_unique_violation(&err) => Err(Error::conflict(record.plate.clone())),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the details of the record with the given plate.
    ///
    /// Returns `true` if a record matched, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_details(&self, plate: &str, details: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let matched = self.conn.execute(
            "UPDATE records SET details = ?1, updated_at = ?2 WHERE plate = ?3",
            params![details, now, plate],
        )?;
        Ok(matched > 0)
    }

    /// Delete the record with the given plate.
    ///
    /// Returns `true` if a record was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, plate: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM records WHERE plate = ?1", [plate])?;
        Ok(affected > 0)
    }

    /// Count total records in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_records = self.count()?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(created_at), MAX(updated_at) FROM records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == MEMORY_PATH {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_records,
            oldest_record: oldest.as_deref().and_then(parse_timestamp),
            last_update: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    /// Flush the write-ahead log into the main database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint fails.
    pub fn checkpoint(&self) -> Result<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            .optional()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Close the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` refuses to close the connection.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn.close().map_err(|(_, err)| Error::from(err))?;
        debug!("Closed database at {}", path.display());
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
        Ok(Record {
            id: Some(row.get(0)?),
            plate: row.get(1)?,
            details: row.get(2)?,
        })
    }
}

/// Check whether an error is a violation of a UNIQUE constraint.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of records stored.
    pub total_records: i64,
    /// Creation time of the oldest record.
    pub oldest_record: Option<DateTime<Utc>>,
    /// Most recent insert or update.
    pub last_update: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
