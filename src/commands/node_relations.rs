use migration::m20261014_000002_many_to_many_nodes::{
    Migration, RelationOutcome, ASSOCIATION_TABLE,
};
use tracing::{error, info};

use super::RULE;
use crate::config::DatabaseConfig;
use crate::error::CommandResult;

/// Execute the one-to-many to many-to-many node migration
pub async fn execute(config: &DatabaseConfig) -> CommandResult<RelationOutcome> {
    info!("{}", RULE);
    info!("Database migration: node subscriptions, one-to-many -> many-to-many");
    info!("{}", RULE);

    let db = super::connect(config).await?;
    let result = Migration.run(&db).await;
    super::disconnect(db).await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("[ERROR] Migration failed: {}", e);
            error!("Migration error details: {:?}", e);
            return Err(e.into());
        }
    };

    info!("{}", RULE);
    match &outcome {
        RelationOutcome::AlreadyMigrated { existing } => {
            info!(
                "[SUCCESS] {} already holds {} rows, nodes are many-to-many already",
                ASSOCIATION_TABLE, existing
            );
        }
        RelationOutcome::Migrated {
            migrated, total, ..
        } => {
            info!("[SUCCESS] Migrated {} node-subscription links", migrated);
            info!("{} now holds {} rows", ASSOCIATION_TABLE, total);
            info!("nodes.subscription_id is kept for compatibility");
            info!("Node membership is now read from {}", ASSOCIATION_TABLE);
            info!("The application can be restarted");
        }
    }

    Ok(outcome)
}
