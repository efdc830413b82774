//! `SQLite` schema definitions for platebook.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the records table.
pub const CREATE_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plate TEXT NOT NULL,
    details TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the unique index on `plate`.
///
/// This index is the only uniqueness guarantee; inserts rely on its
/// constraint violation to detect duplicates.
pub const CREATE_PLATE_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_records_plate ON records(plate)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_RECORDS_TABLE,
    CREATE_PLATE_INDEX,
    CREATE_METADATA_TABLE,
];
