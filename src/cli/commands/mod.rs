pub mod admin;
pub mod migrate;
pub mod serve;

use anyhow::Context;

use crate::config::AppConfig;
use crate::database::DatabaseManager;

/// Connects to the configured database and brings the schema up to date.
pub(crate) async fn connect_and_migrate(config: &AppConfig) -> anyhow::Result<DatabaseManager> {
    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    database.migrate().await.context("failed to apply schema")?;
    Ok(database)
}
