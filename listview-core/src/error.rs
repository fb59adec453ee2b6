//! Error types for listview-core.
//!
//! The engine itself never fails on well-formed records; errors only surface
//! where configuration enters (column tables, preset and direction names).

use thiserror::Error;

/// Listview error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListViewError {
    #[error("Invalid column table: {0}")]
    InvalidTable(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown date preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid sort direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for listview operations
pub type ListViewResult<T> = Result<T, ListViewError>;

impl serde::Serialize for ListViewError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
