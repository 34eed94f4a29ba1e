use core_config::Environment;
use resource_factory::{ErrorKind, FactoryError, GENERIC_ERROR_MESSAGE};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Conflict(_) => ErrorKind::Conflict,
            CatalogError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Internal details are replaced by a generic message outside development
    pub fn public_message(&self, environment: &Environment) -> String {
        match self {
            CatalogError::Internal(_) if !environment.exposes_error_details() => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<FactoryError> for CatalogError {
    fn from(err: FactoryError) -> Self {
        match err {
            FactoryError::Validation(msg) => CatalogError::Validation(msg),
            FactoryError::NotFound(msg) => CatalogError::NotFound(msg),
            FactoryError::Conflict(msg) => CatalogError::Conflict(msg),
            FactoryError::Internal(msg) => CatalogError::Internal(msg),
        }
    }
}

impl From<ValidationErrors> for CatalogError {
    fn from(err: ValidationErrors) -> Self {
        CatalogError::Validation(err.to_string())
    }
}

/// Stored documents that do not decode into the domain model
impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Internal(format!("Malformed document: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_errors_keep_their_kind() {
        let err: CatalogError = FactoryError::NotFound("Brand not found".into()).into();
        assert_eq!(err, CatalogError::NotFound("Brand not found".into()));
        assert_eq!(err.kind().status_code(), 404);

        let err: CatalogError = FactoryError::Conflict("taken".into()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_internal_message_hidden_in_production() {
        let err = CatalogError::Internal("connection reset".into());
        assert_eq!(
            err.public_message(&Environment::Production),
            "Something went wrong"
        );
        assert!(err
            .public_message(&Environment::Development)
            .contains("connection reset"));
    }

    #[test]
    fn test_client_errors_are_never_hidden() {
        let err = CatalogError::Conflict("Brand is still referenced by 2 products".into());
        assert_eq!(
            err.public_message(&Environment::Production),
            "Brand is still referenced by 2 products"
        );
    }
}
