use crate::{ConfigError, FromEnv, env_or_default, env_parse};

const DEFAULT_DATABASE: &str = "catalog";

/// MongoDB connection settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MongoConfig {
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    pub url: String,

    pub database: String,

    /// Reported to the server in its logs
    pub app_name: Option<String>,

    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_database(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            database: DEFAULT_DATABASE.to_string(),
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

/// Environment variables:
/// - `MONGODB_URL` or `MONGO_URL` (required)
/// - `MONGODB_DATABASE` (default: `catalog`)
/// - `MONGODB_APP_NAME` (optional)
/// - `MONGODB_MAX_POOL_SIZE` (default: 100)
/// - `MONGODB_MIN_POOL_SIZE` (default: 5)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (default: 10)
/// - `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (default: 30)
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        // MONGODB_URL first, MONGO_URL as fallback
        let url = std::env::var("MONGODB_URL")
            .or_else(|_| std::env::var("MONGO_URL"))
            .map_err(|_| ConfigError::MissingEnvVar("MONGODB_URL or MONGO_URL".to_string()))?;

        let defaults = Self::default();
        let max_pool_size = env_parse("MONGODB_MAX_POOL_SIZE", defaults.max_pool_size)?;
        let min_pool_size = env_parse("MONGODB_MIN_POOL_SIZE", defaults.min_pool_size)?;
        if min_pool_size > max_pool_size {
            return Err(ConfigError::ParseError {
                key: "MONGODB_MIN_POOL_SIZE".to_string(),
                details: format!(
                    "min pool size {} exceeds max pool size {}",
                    min_pool_size, max_pool_size
                ),
            });
        }

        Ok(Self {
            url,
            database: env_or_default("MONGODB_DATABASE", DEFAULT_DATABASE),
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            max_pool_size,
            min_pool_size,
            connect_timeout_secs: env_parse(
                "MONGODB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            server_selection_timeout_secs: env_parse(
                "MONGODB_SERVER_SELECTION_TIMEOUT_SECS",
                defaults.server_selection_timeout_secs,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONGO_VARS: [&str; 8] = [
        "MONGODB_URL",
        "MONGO_URL",
        "MONGODB_DATABASE",
        "MONGODB_APP_NAME",
        "MONGODB_MAX_POOL_SIZE",
        "MONGODB_MIN_POOL_SIZE",
        "MONGODB_CONNECT_TIMEOUT_SECS",
        "MONGODB_SERVER_SELECTION_TIMEOUT_SECS",
    ];

    #[test]
    fn test_mongo_config_new_uses_defaults() {
        let config = MongoConfig::new("mongodb://prod-host:27017");
        assert_eq!(config.url, "mongodb://prod-host:27017");
        assert_eq!(config.database, "catalog");
        assert_eq!(config.max_pool_size, 100);
        assert_eq!(config.min_pool_size, 5);
        assert_eq!(config.app_name, None);
    }

    #[test]
    fn test_mongo_config_builders() {
        let config = MongoConfig::with_database("mongodb://localhost:27017", "shop")
            .with_app_name("catalog-api");
        assert_eq!(config.database, "shop");
        assert_eq!(config.app_name.as_deref(), Some("catalog-api"));
    }

    #[test]
    fn test_mongo_config_from_env_success() {
        temp_env::with_vars_unset(MONGO_VARS, || {
            temp_env::with_vars(
                [
                    ("MONGODB_URL", Some("mongodb://localhost:27017")),
                    ("MONGODB_DATABASE", Some("testdb")),
                    ("MONGODB_MAX_POOL_SIZE", Some("20")),
                ],
                || {
                    let config = MongoConfig::from_env().unwrap();
                    assert_eq!(config.url, "mongodb://localhost:27017");
                    assert_eq!(config.database, "testdb");
                    assert_eq!(config.max_pool_size, 20);
                    assert_eq!(config.connect_timeout_secs, 10);
                },
            );
        });
    }

    #[test]
    fn test_mongo_config_from_env_fallback_url() {
        temp_env::with_vars_unset(MONGO_VARS, || {
            temp_env::with_var("MONGO_URL", Some("mongodb://fallback:27017"), || {
                let config = MongoConfig::from_env().unwrap();
                assert_eq!(config.url, "mongodb://fallback:27017");
                assert_eq!(config.database, "catalog");
            });
        });
    }

    #[test]
    fn test_mongo_config_from_env_missing() {
        temp_env::with_vars_unset(MONGO_VARS, || {
            let err = MongoConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("MONGODB_URL"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_mongo_config_from_env_rejects_bad_numbers() {
        temp_env::with_vars_unset(MONGO_VARS, || {
            temp_env::with_vars(
                [
                    ("MONGODB_URL", Some("mongodb://localhost:27017")),
                    ("MONGODB_MAX_POOL_SIZE", Some("lots")),
                ],
                || {
                    let err = MongoConfig::from_env().unwrap_err();
                    assert!(err.to_string().contains("MONGODB_MAX_POOL_SIZE"));
                },
            );
        });
    }

    #[test]
    fn test_mongo_config_from_env_rejects_inverted_pool() {
        temp_env::with_vars_unset(MONGO_VARS, || {
            temp_env::with_vars(
                [
                    ("MONGODB_URL", Some("mongodb://localhost:27017")),
                    ("MONGODB_MAX_POOL_SIZE", Some("4")),
                    ("MONGODB_MIN_POOL_SIZE", Some("8")),
                ],
                || {
                    let err = MongoConfig::from_env().unwrap_err();
                    assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "MONGODB_MIN_POOL_SIZE"));
                },
            );
        });
    }
}
