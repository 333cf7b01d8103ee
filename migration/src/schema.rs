//! SQLite schema introspection used by the migrations to decide what to change.

use sea_orm::{ConnectionTrait, DbErr, FromQueryResult, RuntimeErr, Statement};
use serde::Serialize;

/// One column as reported by `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// 1-based position within the primary key, 0 when not part of it
    pub primary_key_position: i32,
}

/// Lists the columns of `table`. An empty list means the table does not exist.
pub async fn table_columns<C>(conn: &C, table: &str) -> Result<Vec<ColumnInfo>, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        r#"SELECT name, type AS column_type, "notnull" AS not_null,
                  dflt_value AS default_value, pk AS primary_key_position
           FROM pragma_table_info(?)
           ORDER BY cid"#,
        [table.into()],
    );

    ColumnInfo::find_by_statement(stmt).all(conn).await
}

pub fn has_column(columns: &[ColumnInfo], name: &str) -> bool {
    columns.iter().any(|column| column.name == name)
}

pub async fn has_table<C>(conn: &C, table: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    has_object(conn, "table", table).await
}

pub async fn has_index<C>(conn: &C, index: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    has_object(conn, "index", index).await
}

async fn has_object<C>(conn: &C, kind: &str, name: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = ? AND name = ?",
        [kind.into(), name.into()],
    );

    Ok(fetch_count(conn, stmt).await? > 0)
}

/// Counts the rows of `table`. The name is quoted, never bound.
pub async fn count_rows<C>(conn: &C, table: &str) -> Result<i64, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Statement::from_string(
        conn.get_database_backend(),
        format!(r#"SELECT COUNT(*) AS count FROM "{}""#, table.replace('"', "\"\"")),
    );

    fetch_count(conn, stmt).await
}

pub(crate) async fn fetch_count<C>(conn: &C, stmt: Statement) -> Result<i64, DbErr>
where
    C: ConnectionTrait,
{
    match conn.query_one(stmt).await? {
        Some(row) => row.try_get("", "count"),
        None => Ok(0),
    }
}

/// SQLITE_ERROR, the primary result code SQLite uses for "object already exists".
const SQLITE_ERROR: &str = "1";

/// True only when `err` is SQLite refusing to create an object that is already there.
pub fn is_already_exists(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return false,
    };

    match runtime {
        RuntimeErr::SqlxError(sea_orm::SqlxError::Database(db_err)) => {
            db_err.code().as_deref() == Some(SQLITE_ERROR)
                && db_err.message().ends_with("already exists")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{Database, DatabaseConnection};
    use tempfile::TempDir;

    async fn scratch_db() -> (TempDir, DatabaseConnection) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("schema.db").display());
        let db = Database::connect(&url).await.unwrap();
        db.execute_unprepared(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                username VARCHAR(80) NOT NULL,
                role VARCHAR(20) DEFAULT 'user'
            )",
        )
        .await
        .unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_table_columns_are_typed() {
        let (_dir, db) = scratch_db().await;

        let columns = table_columns(&db, "users").await.unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "username", "role"]);

        assert_eq!(columns[0].primary_key_position, 1);
        assert!(columns[1].not_null);
        assert_eq!(columns[1].column_type, "VARCHAR(80)");
        assert_eq!(columns[2].default_value.as_deref(), Some("'user'"));

        assert!(has_column(&columns, "username"));
        assert!(!has_column(&columns, "custom_slug"));
    }

    #[tokio::test]
    async fn test_missing_table_has_no_columns() {
        let (_dir, db) = scratch_db().await;
        assert!(table_columns(&db, "nodes").await.unwrap().is_empty());
        assert!(!has_table(&db, "nodes").await.unwrap());
        assert!(has_table(&db, "users").await.unwrap());
    }

    #[tokio::test]
    async fn test_index_lookup_and_row_count() {
        let (_dir, db) = scratch_db().await;
        assert!(!has_index(&db, "idx_users_username").await.unwrap());

        db.execute_unprepared("CREATE INDEX idx_users_username ON users(username)")
            .await
            .unwrap();
        db.execute_unprepared("INSERT INTO users (username) VALUES ('a'), ('b')")
            .await
            .unwrap();

        assert!(has_index(&db, "idx_users_username").await.unwrap());
        assert_eq!(count_rows(&db, "users").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_already_exists_is_recognised() {
        let (_dir, db) = scratch_db().await;
        db.execute_unprepared("CREATE INDEX idx_users_username ON users(username)")
            .await
            .unwrap();

        let err = db
            .execute_unprepared("CREATE INDEX idx_users_username ON users(username)")
            .await
            .unwrap_err();
        assert!(is_already_exists(&err), "unexpected error: {err}");

        let err = db
            .execute_unprepared("CREATE TABLE users (id INTEGER)")
            .await
            .unwrap_err();
        assert!(is_already_exists(&err), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_other_errors_are_not_conflicts() {
        let (_dir, db) = scratch_db().await;

        let err = db
            .execute_unprepared("CREATE INDEX idx_nodes_name ON nodes(name)")
            .await
            .unwrap_err();
        assert!(!is_already_exists(&err));

        db.execute_unprepared("CREATE UNIQUE INDEX idx_users_username ON users(username)")
            .await
            .unwrap();
        db.execute_unprepared("INSERT INTO users (username) VALUES ('a')")
            .await
            .unwrap();
        let err = db
            .execute_unprepared("INSERT INTO users (username) VALUES ('a')")
            .await
            .unwrap_err();
        assert!(!is_already_exists(&err));

        assert!(!is_already_exists(&DbErr::Custom("index already exists".into())));
    }
}
