use std::path::PathBuf;

use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by the migration commands
#[derive(Debug, Error)]
pub enum CommandError {
    /// The database file is absent, nothing was opened or changed
    #[error("Database file not found: {}", .0.display())]
    MissingDatabase(PathBuf),

    #[error("Failed to connect to database: {0}")]
    Connection(sqlx::Error),

    #[error("Migration failed: {0}")]
    Database(#[from] DbErr),

    #[error("Failed to render status: {0}")]
    Render(#[from] serde_json::Error),
}

pub type CommandResult<T> = Result<T, CommandError>;
