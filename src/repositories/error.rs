//! Errori del livello dati

use crate::utils::StringError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("missing required argument `{0}`")]
    ArgumentMissing(&'static str),

    #[error("validation failed: {0}")]
    Validation(String),

    /// The row changed (or vanished) since it was read
    #[error("concurrency conflict on {table} with key {key}")]
    ConcurrencyConflict { table: &'static str, key: String },

    /// Any non-concurrency failure of a multi-row delete, rolled back
    #[error("failed to update {table}")]
    UpdateFailed {
        table: &'static str,
        #[source]
        source: Box<RepoError>,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Database(sqlx::Error),
}

impl RepoError {
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, RepoError::ConcurrencyConflict { .. })
    }
}

/// A column holding text that no longer maps to a known enum member is a
/// validation failure, not a database one
impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::ColumnDecode { index, source } = &err {
            if let Some(invalid) = source.downcast_ref::<StringError>() {
                return RepoError::Validation(format!("column {index}: {invalid}"));
            }
        }
        RepoError::Database(err)
    }
}

impl From<StringError> for RepoError {
    fn from(err: StringError) -> Self {
        RepoError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for RepoError {
    fn from(err: validator::ValidationErrors) -> Self {
        RepoError::Validation(err.to_string())
    }
}
