//! Storage collaborator seam.
//!
//! The engine never talks to a database driver directly. Anything able to run
//! a rendered `Statement` and hand back scalars, columns or rows can back it.
//! Calls are blocking; transactions belong to the caller.

use thiserror::Error;

use super::statement::{SqlValue, Statement};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage connection failed: {message}")]
    Connection { message: String },
    #[error("constraint violated: {message}")]
    Constraint { message: String },
    #[error("query failed: {message}")]
    Query { message: String },
    #[error("unexpected result shape: {message}")]
    Decode { message: String },
    #[error("no insert id available after insert")]
    MissingInsertId,
}

impl StorageError {
    pub fn connection(message: impl std::fmt::Display) -> Self {
        Self::Connection {
            message: message.to_string(),
        }
    }

    pub fn constraint(message: impl std::fmt::Display) -> Self {
        Self::Constraint {
            message: message.to_string(),
        }
    }

    pub fn query(message: impl std::fmt::Display) -> Self {
        Self::Query {
            message: message.to_string(),
        }
    }

    pub fn decode(message: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: message.to_string(),
        }
    }
}

/// One result row, columns in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }
}

pub trait QueryExecutor: Send + Sync {
    /// First column of the first row, or `None` when no row matched.
    fn scalar(&self, statement: &Statement) -> Result<Option<SqlValue>, StorageError>;

    /// First column of every row.
    fn column(&self, statement: &Statement) -> Result<Vec<SqlValue>, StorageError>;

    fn rows(&self, statement: &Statement) -> Result<Vec<Row>, StorageError>;

    /// Run a write; returns the affected row count.
    fn execute(&self, statement: &Statement) -> Result<u64, StorageError>;

    /// Id generated by the most recent insert on this executor.
    fn last_insert_id(&self) -> Result<i64, StorageError>;
}
