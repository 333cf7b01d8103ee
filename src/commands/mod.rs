use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::{CommandError, CommandResult};

pub mod custom_slug;
pub mod migrate;
pub mod node_relations;
pub mod status;

const RULE: &str = "============================================================";

/// Opens the single connection a command works through.
///
/// Fails without touching the filesystem when the database file is absent.
pub async fn connect(config: &DatabaseConfig) -> CommandResult<DatabaseConnection> {
    if !config.path.is_file() {
        error!("Database file not found: {}", config.path.display());
        error!("Start the Clash Manager once to initialise the database");
        return Err(CommandError::MissingDatabase(config.path.clone()));
    }

    info!("Connecting to database: {}", config.path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect_with(config.connect_options())
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            CommandError::Connection(e)
        })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Closes the connection, logging rather than failing if the driver complains.
pub async fn disconnect(db: DatabaseConnection) {
    if let Err(e) = db.close().await {
        error!("Failed to close database connection: {}", e);
    }
}
