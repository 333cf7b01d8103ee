use sqlx::sqlite::SqliteConnectOptions;
use sqlx::ConnectOptions;
use std::env;
use std::path::PathBuf;

/// Where the Clash Manager keeps its database, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "instance/clash_manager.db";

/// Environment variable overriding [`DEFAULT_DATABASE_PATH`]
pub const DATABASE_PATH_VAR: &str = "CLASH_MANAGER_DB";

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file
    pub path: PathBuf,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Driver options for `path`, taken as a file name rather than parsed as a URL.
    /// A missing database is never created.
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(false)
            .foreign_keys(true)
            .disable_statement_logging()
    }

    /// Load database configuration from the environment, unless a path was given
    /// on the command line.
    pub fn from_env(cli_path: Option<PathBuf>) -> Self {
        Self::resolve(cli_path, env::var(DATABASE_PATH_VAR).ok())
    }

    pub fn resolve(cli_path: Option<PathBuf>, env_path: Option<String>) -> Self {
        let path = cli_path
            .or_else(|| env_path.filter(|p| !p.trim().is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        Self::new(path)
    }
}
