use serde::{Deserialize, Serialize};

use crate::filter::OperatorPolicy;
use crate::pagination::PaginationConfig;
#[cfg(feature = "config")]
use crate::pagination::{DEFAULT_LIMIT, MAX_LIMIT};

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv};

/// Tunables shared by every pipeline built by one service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub pagination: PaginationConfig,
    pub operators: OperatorPolicy,
}

impl QueryOptions {
    pub fn with_operator_policy(mut self, operators: OperatorPolicy) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_limits(mut self, default_limit: u64, max_limit: u64) -> Self {
        self.pagination = PaginationConfig {
            default_limit,
            max_limit,
        };
        self
    }
}

/// Load QueryOptions from environment variables
///
/// - `QUERY_DEFAULT_LIMIT` (optional, default: 10)
/// - `QUERY_MAX_LIMIT` (optional, default: 100)
/// - `QUERY_OPERATOR_POLICY` (optional, `allow_list` | `passthrough`, default: `allow_list`)
#[cfg(feature = "config")]
impl FromEnv for QueryOptions {
    fn from_env() -> Result<Self, ConfigError> {
        let default_limit = core_config::env_parse("QUERY_DEFAULT_LIMIT", DEFAULT_LIMIT)?;
        let max_limit = core_config::env_parse("QUERY_MAX_LIMIT", MAX_LIMIT)?;
        let operators =
            core_config::env_parse("QUERY_OPERATOR_POLICY", OperatorPolicy::default())?;

        if default_limit == 0 || default_limit > max_limit {
            return Err(ConfigError::ParseError {
                key: "QUERY_DEFAULT_LIMIT".to_string(),
                details: format!("must be between 1 and QUERY_MAX_LIMIT ({})", max_limit),
            });
        }

        Ok(Self {
            pagination: PaginationConfig {
                default_limit,
                max_limit,
            },
            operators,
        })
    }
}
