use migration::m20261014_000001_add_custom_slug::{Migration, SlugReport};
use tracing::{error, info};

use super::RULE;
use crate::config::DatabaseConfig;
use crate::error::CommandResult;

/// Execute the add-custom-slug migration
pub async fn execute(config: &DatabaseConfig) -> CommandResult<SlugReport> {
    info!("{}", RULE);
    info!("Database migration: custom link slugs");
    info!("{}", RULE);

    let db = super::connect(config).await?;
    let result = Migration.run(&db).await;
    super::disconnect(db).await;

    match result {
        Ok(report) => {
            info!("{}", RULE);
            if report.changed() {
                info!("[SUCCESS] Custom slug migration complete");
                info!("Users and subscription groups accept an optional custom link slug");
                info!("Links resolve through either the custom slug or the generated token");
            } else {
                info!("[SUCCESS] Custom slugs already present, nothing to do");
            }
            Ok(report)
        }
        Err(e) => {
            error!("[ERROR] Migration failed: {}", e);
            error!("Migration error details: {:?}", e);
            Err(e.into())
        }
    }
}
