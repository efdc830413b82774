//! Core record types for platebook.
//!
//! A record pairs a license plate (its unique identifier) with a free-text
//! details note. This module also owns the rules for how plates are
//! normalized and which request fields count as present.

use serde::{Deserialize, Serialize};

/// A stored plate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the store on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// The license plate. Unique and immutable once created.
    pub plate: String,

    /// Free-text note attached to the plate.
    pub details: String,
}

impl Record {
    /// Create a record that has not been stored yet.
    #[must_use]
    pub fn new(plate: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: None,
            plate: plate.into(),
            details: details.into(),
        }
    }
}

/// Input for creating a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// The license plate to register.
    pub plate: String,
    /// Details for the new plate.
    pub details: String,
}

impl NewRecord {
    /// Create a new insert payload.
    #[must_use]
    pub fn new(plate: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            plate: plate.into(),
            details: details.into(),
        }
    }

    /// Attach the store-assigned identifier, producing a [`Record`].
    #[must_use]
    pub fn into_record(self, id: Option<i64>) -> Record {
        Record {
            id,
            plate: self.plate,
            details: self.details,
        }
    }
}

/// How plates are compared and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatePolicy {
    /// Trim surrounding whitespace and uppercase before any lookup or write.
    #[default]
    Normalize,
    /// Use the plate exactly as received. Uniqueness is case-sensitive.
    Exact,
}

impl PlatePolicy {
    /// Apply this policy to a raw plate.
    #[must_use]
    pub fn apply(self, plate: &str) -> String {
        match self {
            Self::Normalize => plate.trim().to_uppercase(),
            Self::Exact => plate.to_string(),
        }
    }
}

impl std::fmt::Display for PlatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normalize => write!(f, "normalize"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// Return the field if it is present and not blank.
#[must_use]
pub fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|value| !value.trim().is_empty())
}
