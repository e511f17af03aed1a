//! Error types module
//!
//! `AppError` is the error returned by repositories and bootstrap helpers that
//! sit between the worker and its external collaborators.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Database(_) | AppError::Internal(_) => true,
            AppError::InvalidInput(_) | AppError::NotFound(_) | AppError::Config(_) => false,
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => AppError::NotFound("row not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_not_recoverable() {
        assert!(!AppError::InvalidInput("bad id".into()).is_recoverable());
        assert!(!AppError::NotFound("file".into()).is_recoverable());
        assert!(AppError::Internal("pool closed".into()).is_recoverable());
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = SqlxError::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
