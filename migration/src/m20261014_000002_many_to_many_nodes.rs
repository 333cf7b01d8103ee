use chrono::Utc;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{
    DatabaseTransaction, FromQueryResult, Statement, TransactionTrait,
};
use serde::Serialize;
use tracing::{error, info};

use crate::schema;

pub const ASSOCIATION_TABLE: &str = "subscription_node";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RelationOutcome {
    /// The association table already held rows, nothing was written
    AlreadyMigrated { existing: i64 },
    Migrated {
        table_created: bool,
        migrated: u64,
        total: i64,
    },
}

/// Moves node membership from `nodes.subscription_id` to the `subscription_node`
/// association table so a node can belong to several subscription groups.
///
/// The legacy column is left as it is.
pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20261014_000002_many_to_many_nodes"
    }
}

impl Migration {
    /// Creates the association table if needed and copies the legacy links, all in
    /// one transaction.
    ///
    /// Foreign keys are switched off for the copy so links to groups that are no
    /// longer there are carried over too, and switched back afterwards. SQLite
    /// applies the pragma per connection, so `db` must hold a single connection.
    pub async fn run<C>(&self, db: &C) -> Result<RelationOutcome, DbErr>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        info!("Running {}", self.name());

        let enforced = foreign_keys_enforced(db).await?;
        if enforced {
            db.execute_unprepared("PRAGMA foreign_keys = OFF").await?;
        }

        let result = copy_in_transaction(db).await;

        if enforced {
            if let Err(err) = db.execute_unprepared("PRAGMA foreign_keys = ON").await {
                error!("Failed to re-enable foreign keys: {}", err);
                // The copy error, if any, is the one worth surfacing
                return result.and(Err(err));
            }
        }

        result
    }
}

async fn copy_in_transaction<C>(db: &C) -> Result<RelationOutcome, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    match copy_links(&txn).await {
        Ok(outcome) => {
            txn.commit().await?;
            Ok(outcome)
        }
        Err(err) => {
            error!("Migration failed, rolling back: {}", err);
            if let Err(rollback_err) = txn.rollback().await {
                error!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn foreign_keys_enforced<C>(db: &C) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Statement::from_string(db.get_database_backend(), "PRAGMA foreign_keys");
    match db.query_one(stmt).await? {
        Some(row) => Ok(row.try_get::<i64>("", "foreign_keys")? != 0),
        None => Ok(false),
    }
}

#[derive(Debug, FromQueryResult)]
struct LegacyLink {
    node_id: i64,
    subscription_id: i64,
}

async fn copy_links(txn: &DatabaseTransaction) -> Result<RelationOutcome, DbErr> {
    let table_created = if schema::has_table(txn, ASSOCIATION_TABLE).await? {
        info!("{} already exists", ASSOCIATION_TABLE);

        // Re-inserting would collide with the composite primary key
        let existing = schema::count_rows(txn, ASSOCIATION_TABLE).await?;
        if existing > 0 {
            info!(
                "{} already holds {} rows, skipping migration",
                ASSOCIATION_TABLE, existing
            );
            return Ok(RelationOutcome::AlreadyMigrated { existing });
        }

        info!("{} is empty, importing links from nodes", ASSOCIATION_TABLE);
        false
    } else {
        txn.execute(txn.get_database_backend().build(&create_association_table()))
            .await?;
        info!("[+] Created {}", ASSOCIATION_TABLE);
        true
    };

    let links = legacy_links(txn).await?;
    let mut migrated = 0;

    for link in links {
        let mut insert = Query::insert();
        insert.into_table(SubscriptionNode::Table).columns([
            SubscriptionNode::NodeId,
            SubscriptionNode::SubscriptionId,
            SubscriptionNode::CreatedAt,
        ]);
        insert
            .values([
                link.node_id.into(),
                link.subscription_id.into(),
                Utc::now().naive_utc().into(),
            ])
            .map_err(|e| DbErr::Custom(e.to_string()))?;

        txn.execute(txn.get_database_backend().build(&insert))
            .await?;
        migrated += 1;
    }
    info!("[+] Migrated {} node-subscription links", migrated);

    let total = schema::count_rows(txn, ASSOCIATION_TABLE).await?;

    Ok(RelationOutcome::Migrated {
        table_created,
        migrated,
        total,
    })
}

/// Every node that still points at a subscription group.
async fn legacy_links(txn: &DatabaseTransaction) -> Result<Vec<LegacyLink>, DbErr> {
    let stmt = Statement::from_string(
        txn.get_database_backend(),
        r#"SELECT id AS node_id, subscription_id
           FROM nodes
           WHERE subscription_id IS NOT NULL"#,
    );

    LegacyLink::find_by_statement(stmt).all(txn).await
}

fn create_association_table() -> TableCreateStatement {
    Table::create()
        .table(SubscriptionNode::Table)
        .col(
            ColumnDef::new(SubscriptionNode::SubscriptionId)
                .integer()
                .not_null(),
        )
        .col(ColumnDef::new(SubscriptionNode::NodeId).integer().not_null())
        .col(
            ColumnDef::new(SubscriptionNode::CreatedAt)
                .custom(Alias::new("TIMESTAMP"))
                .default(Expr::current_timestamp()),
        )
        .primary_key(
            Index::create()
                .col(SubscriptionNode::SubscriptionId)
                .col(SubscriptionNode::NodeId),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_subscription_node_subscription")
                .from(SubscriptionNode::Table, SubscriptionNode::SubscriptionId)
                .to(Subscriptions::Table, Subscriptions::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_subscription_node_node")
                .from(SubscriptionNode::Table, SubscriptionNode::NodeId)
                .to(Nodes::Table, Nodes::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(DeriveIden)]
enum SubscriptionNode {
    Table,
    SubscriptionId,
    NodeId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Nodes {
    Table,
    Id,
}
