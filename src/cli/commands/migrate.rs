use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let database = super::connect_and_migrate(config).await?;
    database.close().await;

    let target = config
        .database
        .url
        .as_deref()
        .and_then(|url| DatabaseManager::redacted_url(url).ok())
        .unwrap_or_default();
    output_success(&output_format, "Schema is up to date", Some(json!({ "database": target })))
}
