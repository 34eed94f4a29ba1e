use thiserror::Error;

/// Errors raised while turning request parameters into a query.
///
/// Every variant describes malformed client input; callers classify all of
/// them as validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Operator '{operator}' is not allowed on field '{field}'")]
    DisallowedOperator { field: String, operator: String },

    #[error("Malformed filter key '{0}'")]
    MalformedKey(String),

    #[error("Invalid value '{value}' for field '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Cannot mix field inclusion and exclusion in '{0}'")]
    MixedProjection(String),

    #[error("Operator '{0}' cannot be evaluated by this backend")]
    UnsupportedOperator(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
