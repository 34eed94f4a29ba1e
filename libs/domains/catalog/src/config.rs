use core_config::{ConfigError, Environment, FromEnv};
use query_features::QueryOptions;

/// Catalog settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Prefix for stored image names, e.g. `https://cdn.example.com`.
    /// Image names are returned unchanged when unset.
    pub base_url: Option<String>,

    /// Pagination limits and operator policy for listings
    pub query: QueryOptions,

    pub environment: Environment,
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url.into());
        self
    }

    pub fn with_query_options(mut self, query: QueryOptions) -> Self {
        self.query = query;
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            query: QueryOptions::default(),
            environment: Environment::Development,
        }
    }
}

fn normalize_base_url(raw: String) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Environment variables:
/// - `BASE_URL` (optional) - image URL prefix
/// - `APP_ENV` (default: development)
/// - `QUERY_DEFAULT_LIMIT`, `QUERY_MAX_LIMIT`, `QUERY_OPERATOR_POLICY`
impl FromEnv for CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: std::env::var("BASE_URL").ok().and_then(normalize_base_url),
            query: QueryOptions::from_env()?,
            environment: Environment::from_env(),
        })
    }
}
