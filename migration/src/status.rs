use sea_orm_migration::sea_orm::Statement;
use sea_orm_migration::prelude::*;
use serde::Serialize;

use crate::m20261014_000001_add_custom_slug::{CUSTOM_SLUG, SLUG_TARGETS};
use crate::m20261014_000002_many_to_many_nodes::ASSOCIATION_TABLE;
use crate::schema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugStatus {
    pub table: &'static str,
    pub table_present: bool,
    pub column_present: bool,
    pub index_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationStatus {
    pub table_present: bool,
    pub rows: i64,
    /// Nodes whose legacy `subscription_id` is set
    pub legacy_links: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    pub slugs: Vec<SlugStatus>,
    pub relations: RelationStatus,
}

impl SchemaStatus {
    /// True once both migrations have left their mark on the schema.
    pub fn is_migrated(&self) -> bool {
        self.slugs.iter().all(|s| s.column_present && s.index_present)
            && self.relations.table_present
    }
}

/// Read-only snapshot of what the two migrations care about.
pub async fn inspect<C>(conn: &C) -> Result<SchemaStatus, DbErr>
where
    C: ConnectionTrait,
{
    let mut slugs = Vec::with_capacity(SLUG_TARGETS.len());
    for target in &SLUG_TARGETS {
        let columns = schema::table_columns(conn, target.table).await?;
        slugs.push(SlugStatus {
            table: target.table,
            table_present: !columns.is_empty(),
            column_present: schema::has_column(&columns, CUSTOM_SLUG),
            index_present: schema::has_index(conn, target.index).await?,
        });
    }

    let table_present = schema::has_table(conn, ASSOCIATION_TABLE).await?;
    let rows = if table_present {
        schema::count_rows(conn, ASSOCIATION_TABLE).await?
    } else {
        0
    };

    let node_columns = schema::table_columns(conn, "nodes").await?;
    let legacy_links = if schema::has_column(&node_columns, "subscription_id") {
        let stmt = Statement::from_string(
            conn.get_database_backend(),
            "SELECT COUNT(*) AS count FROM nodes WHERE subscription_id IS NOT NULL",
        );
        schema::fetch_count(conn, stmt).await?
    } else {
        0
    };

    Ok(SchemaStatus {
        slugs,
        relations: RelationStatus {
            table_present,
            rows,
            legacy_links,
        },
    })
}
