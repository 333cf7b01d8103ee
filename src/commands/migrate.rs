use migration::m20261014_000001_add_custom_slug::SlugReport;
use migration::m20261014_000002_many_to_many_nodes::RelationOutcome;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::CommandResult;

/// Outcome of running every migration in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateSummary {
    pub custom_slug: SlugReport,
    pub node_relations: RelationOutcome,
}

/// Execute all migrations in order, stopping at the first failure
pub async fn execute(config: &DatabaseConfig) -> CommandResult<MigrateSummary> {
    info!("Running all migrations against {}", config.path.display());

    let custom_slug = super::custom_slug::execute(config).await?;
    let node_relations = super::node_relations::execute(config).await?;

    info!("Successfully ran all migrations");

    Ok(MigrateSummary {
        custom_slug,
        node_relations,
    })
}
