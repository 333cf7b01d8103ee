use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use clash_migrate::commands;
use clash_migrate::DatabaseConfig;

/// Clash Manager database migration CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file (default: instance/clash_manager.db)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available migration commands
#[derive(Subcommand)]
enum Commands {
    /// Add the optional unique custom_slug column to users and subscriptions
    AddCustomSlug,
    /// Move node memberships into the subscription_node association table
    ManyToManyNodes,
    /// Run every migration in order
    Migrate,
    /// Show database status
    Status {
        /// Print the status as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    // Logs go to stderr so stdout stays machine-readable for `status --json`
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let cli = Cli::parse();
    let config = DatabaseConfig::from_env(cli.database);

    // Execute command
    match cli.command {
        Commands::AddCustomSlug => {
            commands::custom_slug::execute(&config).await?;
        }
        Commands::ManyToManyNodes => {
            commands::node_relations::execute(&config).await?;
        }
        Commands::Migrate => {
            commands::migrate::execute(&config).await?;
        }
        Commands::Status { json } => {
            commands::status::execute(&config, json).await?;
        }
    }

    Ok(())
}
