use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Error taxonomy shared by every store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("version conflict while updating {0}")]
    VersionConflict(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl StoreError {
    /// Single mapping point from driver errors to the taxonomy.
    /// Unique-key violations become `Duplicate`; everything else is
    /// surfaced as a wrapped database error.
    pub(crate) fn from_db(err: DbErr, resource: &'static str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate(resource),
            _ => StoreError::Db(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict(_))
    }
}
