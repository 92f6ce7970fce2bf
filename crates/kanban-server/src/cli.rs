use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kanban-board")]
#[command(about = "Requirement board API with consistent drag-and-drop ordering", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE", env = "KANBAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Apply schema migrations
    Migrate(MigrateArgs),
    /// Report schema version and detected capabilities
    Status(StatusArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(long)]
    pub bind: Option<String>,
    /// SQLite database file
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,
    /// Serve the schema as found instead of migrating first
    #[arg(long)]
    pub skip_migrations: bool,
}

#[derive(Args)]
pub struct MigrateArgs {
    /// SQLite database file
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,
    /// Stop before the migration that adds manual ordering
    #[arg(long)]
    pub skip_ordering: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    /// SQLite database file
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,
}
