#![allow(dead_code)]

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tempfile::TempDir;

/// A scratch copy of the pre-migration Clash Manager schema.
///
/// `nodes.subscription_id` carries no foreign key here so tests can seed links
/// to groups that no longer exist.
pub const LEGACY_SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        username VARCHAR(80) NOT NULL UNIQUE,
        token VARCHAR(64)
    )",
    "CREATE TABLE subscriptions (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100) NOT NULL
    )",
    "CREATE TABLE nodes (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        subscription_id INTEGER
    )",
];

pub struct TestDb {
    // Held so the directory outlives the connection
    _dir: TempDir,
    pub db: DatabaseConnection,
}

pub async fn empty_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("clash_manager.db").display()
    );
    // One connection, as the CLI uses, so per-connection pragmas stick
    let mut options = ConnectOptions::new(url);
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    TestDb { _dir: dir, db }
}

pub async fn legacy_db() -> TestDb {
    let test_db = empty_db().await;
    for sql in LEGACY_SCHEMA {
        exec(&test_db.db, sql).await;
    }
    test_db
}

pub async fn exec(db: &DatabaseConnection, sql: &str) {
    db.execute_unprepared(sql)
        .await
        .unwrap_or_else(|e| panic!("`{sql}` failed: {e}"));
}

/// Runs a query that selects a single `count` column.
pub async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
    db.query_one(Statement::from_string(db.get_database_backend(), sql))
        .await
        .unwrap()
        .unwrap()
        .try_get("", "count")
        .unwrap()
}

/// Every `(subscription_id, node_id)` pair in the association table, ordered.
pub async fn association_pairs(db: &DatabaseConnection) -> Vec<(i64, i64)> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "SELECT subscription_id, node_id FROM subscription_node \
             ORDER BY subscription_id, node_id",
        ))
        .await
        .unwrap();

    rows.iter()
        .map(|row| {
            (
                row.try_get::<i64>("", "subscription_id").unwrap(),
                row.try_get::<i64>("", "node_id").unwrap(),
            )
        })
        .collect()
}

/// The stored DDL of every table and index, for before/after comparisons.
pub async fn schema_snapshot(db: &DatabaseConnection) -> Vec<String> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "SELECT name, sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name",
        ))
        .await
        .unwrap();

    rows.iter()
        .map(|row| row.try_get::<String>("", "sql").unwrap())
        .collect()
}
