use migration::SchemaStatus;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::CommandResult;

/// Show which migrations the database has received
pub async fn execute(config: &DatabaseConfig, json: bool) -> CommandResult<SchemaStatus> {
    let db = super::connect(config).await?;
    let result = migration::inspect(&db).await;
    super::disconnect(db).await;
    let status = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(status);
    }

    for slug in &status.slugs {
        if !slug.table_present {
            info!("{}: table missing", slug.table);
            continue;
        }
        info!(
            "{}: custom_slug column {}, unique index {}",
            slug.table,
            present(slug.column_present),
            present(slug.index_present)
        );
    }

    let relations = &status.relations;
    if relations.table_present {
        info!("subscription_node: present, {} rows", relations.rows);
    } else {
        info!("subscription_node: missing");
    }
    info!("nodes with a legacy subscription_id: {}", relations.legacy_links);

    if status.is_migrated() {
        info!("Database is up to date");
    } else {
        info!("Pending migrations, run `clash-migrate migrate`");
    }

    Ok(status)
}

fn present(flag: bool) -> &'static str {
    if flag {
        "present"
    } else {
        "missing"
    }
}
