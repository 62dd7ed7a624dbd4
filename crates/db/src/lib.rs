pub mod indexes;
pub mod models;

use capmatch_config::DatabaseSettings;
use mongodb::{Client, Database};
use tracing::info;

/// Connects to MongoDB and pings the target database; a bad URI fails at
/// startup instead of on the first webhook.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(&settings.uri).await?;
    let db = client.database(&settings.name);
    db.run_command(bson::doc! { "ping": 1 }).await?;
    info!(database = %settings.name, "Connected to MongoDB");
    Ok(db)
}
