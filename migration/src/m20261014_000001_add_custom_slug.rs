use sea_orm_migration::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::schema;

pub const CUSTOM_SLUG: &str = "custom_slug";
const CUSTOM_SLUG_TYPE: &str = "VARCHAR(100)";

/// A table that gains an optional custom slug, and the partial unique index guarding it.
#[derive(Debug, Clone, Copy)]
pub struct SlugTarget {
    pub table: &'static str,
    pub index: &'static str,
}

pub const SLUG_TARGETS: [SlugTarget; 2] = [
    SlugTarget {
        table: "users",
        index: "idx_users_custom_slug",
    },
    SlugTarget {
        table: "subscriptions",
        index: "idx_subscriptions_custom_slug",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnChange {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexChange {
    Created,
    AlreadyPresent,
    /// The column was already there, so the index was not looked at
    Untouched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugTableOutcome {
    pub table: &'static str,
    pub column: ColumnChange,
    pub index: IndexChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugReport {
    pub tables: Vec<SlugTableOutcome>,
}

impl SlugReport {
    /// Whether this run altered the schema at all.
    pub fn changed(&self) -> bool {
        self.tables.iter().any(|t| {
            t.column == ColumnChange::Added || t.index == IndexChange::Created
        })
    }
}

/// Adds `custom_slug VARCHAR(100) NULL` to users and subscription groups,
/// unique among non-null values.
pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20261014_000001_add_custom_slug"
    }
}

impl Migration {
    /// Migrates each target table in turn. Every statement commits on its own, so a
    /// failure on a later table leaves the earlier ones migrated.
    pub async fn run<C>(&self, conn: &C) -> Result<SlugReport, DbErr>
    where
        C: ConnectionTrait,
    {
        info!("Running {}", self.name());

        let mut tables = Vec::with_capacity(SLUG_TARGETS.len());
        for target in &SLUG_TARGETS {
            tables.push(migrate_table(conn, target).await?);
        }

        Ok(SlugReport { tables })
    }
}

async fn migrate_table<C>(conn: &C, target: &SlugTarget) -> Result<SlugTableOutcome, DbErr>
where
    C: ConnectionTrait,
{
    let columns = schema::table_columns(conn, target.table).await?;
    if columns.is_empty() {
        return Err(DbErr::Migration(format!(
            "table `{}` does not exist",
            target.table
        )));
    }

    if schema::has_column(&columns, CUSTOM_SLUG) {
        info!("[SKIP] {} already has {}", target.table, CUSTOM_SLUG);
        return Ok(SlugTableOutcome {
            table: target.table,
            column: ColumnChange::AlreadyPresent,
            index: IndexChange::Untouched,
        });
    }

    // SQLite cannot add a UNIQUE column, uniqueness comes from the index below
    let alter = Table::alter()
        .table(Alias::new(target.table))
        .add_column(
            ColumnDef::new(Alias::new(CUSTOM_SLUG))
                .custom(Alias::new(CUSTOM_SLUG_TYPE))
                .null(),
        )
        .to_owned();
    conn.execute(conn.get_database_backend().build(&alter))
        .await?;
    info!("[OK] Added {}.{}", target.table, CUSTOM_SLUG);

    let index = create_slug_index(conn, target).await?;

    Ok(SlugTableOutcome {
        table: target.table,
        column: ColumnChange::Added,
        index,
    })
}

async fn create_slug_index<C>(conn: &C, target: &SlugTarget) -> Result<IndexChange, DbErr>
where
    C: ConnectionTrait,
{
    if schema::has_index(conn, target.index).await? {
        info!("[SKIP] Index {} already exists", target.index);
        return Ok(IndexChange::AlreadyPresent);
    }

    let sql = format!(
        r#"CREATE UNIQUE INDEX "{index}" ON "{table}" ("{column}") WHERE "{column}" IS NOT NULL"#,
        index = target.index,
        table = target.table,
        column = CUSTOM_SLUG,
    );

    match conn.execute_unprepared(&sql).await {
        Ok(_) => {
            info!("[OK] Created unique index {}", target.index);
            Ok(IndexChange::Created)
        }
        Err(err) if schema::is_already_exists(&err) => {
            info!("[SKIP] Index {} already exists", target.index);
            Ok(IndexChange::AlreadyPresent)
        }
        Err(err) => Err(err),
    }
}
