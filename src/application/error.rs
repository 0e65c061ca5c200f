use std::error::Error as StdError;

use thiserror::Error;

use crate::{domain::error::DomainError, infra::error::InfraError};

use super::executor::StorageError;

/// Failures surfaced by tagging operations.
#[derive(Debug, Error)]
pub enum TaggingError {
    #[error(
        "tag \"{name}\" does not exist; add it before assigning or enable create_tags_automatically"
    )]
    UnknownTag { name: String },
    #[error("`{table}` record has no primary key yet")]
    MissingPrimaryKey { table: String },
    #[error("`{found}` record cannot use tagging configured for `{expected}`")]
    EntityMismatch { expected: String, found: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Schema(#[from] DomainError),
}

impl TaggingError {
    pub fn unknown_tag(name: impl Into<String>) -> Self {
        Self::UnknownTag { name: name.into() }
    }

    pub fn missing_primary_key(table: impl Into<String>) -> Self {
        Self::MissingPrimaryKey {
            table: table.into(),
        }
    }

    pub fn entity_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::EntityMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Top-level error of the command-line front end.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Tagging(#[from] TaggingError),
}

impl AppError {
    /// Process exit code for the failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Tagging(TaggingError::UnknownTag { .. })
            | AppError::Tagging(TaggingError::EntityMismatch { .. })
            | AppError::Domain(_) => 2,
            AppError::Tagging(TaggingError::Storage(_))
            | AppError::Infra(InfraError::Database { .. }) => 3,
            _ => 1,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self::Tagging(TaggingError::Storage(err))
    }
}

/// Messages of an error and each of its sources, outermost first.
pub fn error_chain(error: &dyn StdError) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(inner) = current {
        messages.push(inner.to_string());
        current = inner.source();
    }
    messages
}
