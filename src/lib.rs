pub mod commands;
pub mod config;
pub mod error;

pub use config::DatabaseConfig;
pub use error::{CommandError, CommandResult};
