use core_config::Environment;
use query_features::QueryError;
use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Message returned in place of internal error details in production
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Failures reported by a persistence adapter, already classified by the
/// adapter itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Invalid id '{0}'")]
    InvalidId(String),

    #[error("Duplicate value for '{field}': {message}")]
    DuplicateKey { field: String, message: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl From<QueryError> for PersistenceError {
    fn from(err: QueryError) -> Self {
        PersistenceError::Validation(err.to_string())
    }
}

/// Category of a [`FactoryError`], for callers mapping to transport codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Conventional HTTP status for the kind
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(self, ErrorKind::Internal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type FactoryResult<T> = Result<T, FactoryError>;

impl FactoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FactoryError::Validation(_) => ErrorKind::Validation,
            FactoryError::NotFound(_) => ErrorKind::NotFound,
            FactoryError::Conflict(_) => ErrorKind::Conflict,
            FactoryError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to show a caller: internal details are hidden in
    /// production.
    pub fn public_message(&self, environment: &Environment) -> String {
        match self {
            FactoryError::Internal(_) if !environment.exposes_error_details() => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    /// Log at a level matching the kind
    pub(crate) fn log(&self, operation: &'static str, collection: &str) {
        match self.kind() {
            ErrorKind::Internal => {
                tracing::error!(operation, collection, error = %self, "Factory operation failed")
            }
            ErrorKind::Conflict | ErrorKind::NotFound => {
                tracing::info!(operation, collection, error = %self, "Factory operation rejected")
            }
            ErrorKind::Validation => {
                tracing::debug!(operation, collection, error = %self, "Factory operation rejected")
            }
        }
    }
}

impl From<QueryError> for FactoryError {
    fn from(err: QueryError) -> Self {
        FactoryError::Validation(err.to_string())
    }
}

impl From<PersistenceError> for FactoryError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::InvalidId(id) => {
                FactoryError::Validation(format!("Invalid id format: {}", id))
            }
            PersistenceError::DuplicateKey { field, .. } => {
                FactoryError::Conflict(format!("A document with this {} already exists", field))
            }
            PersistenceError::Validation(message) => FactoryError::Validation(message),
            PersistenceError::Backend(message) => FactoryError::Internal(message),
        }
    }
}
