use core_config::mongodb::MongoConfig;
use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use std::time::{Duration, Instant};
use tracing::{info, instrument};

use crate::error::{PersistenceError, PersistenceResult};

/// Connect using a MongoConfig and verify the server answers
///
/// # Example
/// ```ignore
/// use core_config::{FromEnv, mongodb::MongoConfig};
///
/// let config = MongoConfig::from_env()?;
/// let client = connect(&config).await?;
/// ```
#[instrument(skip(config), fields(database = %config.database))]
pub async fn connect(config: &MongoConfig) -> PersistenceResult<Client> {
    let mut options = ClientOptions::parse(&config.url).await?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));
    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;
    let elapsed = ping(&client.database(&config.database)).await?;

    info!(ping_ms = elapsed.as_millis() as u64, "Connected to MongoDB");
    Ok(client)
}

/// Connect and return the configured database
pub async fn connect_database(config: &MongoConfig) -> PersistenceResult<Database> {
    let client = connect(config).await?;
    Ok(client.database(&config.database))
}

/// Run `ping` against the database, returning the round trip time
pub async fn ping(database: &Database) -> PersistenceResult<Duration> {
    let start = Instant::now();
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| PersistenceError::Backend(format!("MongoDB ping failed: {}", e)))?;
    Ok(start.elapsed())
}
