use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kanban_core::{AppConfig, OrderingMode};
use kanban_persistence::{CardStore, Migrator, SqliteStore, ORDERING_VERSION};
use serde::Serialize;

use crate::cli::{Cli, Commands, MigrateArgs, ServeArgs, StatusArgs};
use crate::output::output_success;
use crate::server::{start_server, ServerConfig};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateReport {
    pub database: PathBuf,
    pub applied: Vec<u32>,
    pub schema_version: u32,
    pub ordering: bool,
    pub tagging: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub database: PathBuf,
    pub schema_version: u32,
    pub latest_version: u32,
    pub ordering: bool,
    pub tagging: bool,
    pub ordering_mode: OrderingMode,
}

/// Load configuration from `--config` when given, otherwise from the platform path.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

pub async fn handle(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => serve(config, args).await,
        Commands::Migrate(args) => migrate(config, args).await,
        Commands::Status(args) => status(config, args).await,
    }
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    Ok(SqliteStore::new(path))
}

async fn serve(mut config: AppConfig, args: ServeArgs) -> Result<()> {
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    let mut server_config = ServerConfig::from(&config);
    server_config.run_migrations = !args.skip_migrations;
    start_server(server_config).await
}

async fn migrate(config: AppConfig, args: MigrateArgs) -> Result<()> {
    let database = args.database.unwrap_or(config.database_path);
    let store = open_store(&database)?;

    let up_to = args.skip_ordering.then_some(ORDERING_VERSION - 1);
    let applied = store
        .migrate(up_to)
        .await
        .with_context(|| format!("Failed to migrate {}", database.display()))?;
    let versions = store.applied_migrations().await?;
    let capabilities = store.detect_capabilities().await?;
    store.close().await;

    output_success(MigrateReport {
        database,
        applied,
        schema_version: versions.last().copied().unwrap_or(0),
        ordering: capabilities.ordering,
        tagging: capabilities.tagging,
    })?;
    Ok(())
}

async fn status(config: AppConfig, args: StatusArgs) -> Result<()> {
    let database = args.database.unwrap_or(config.database_path);
    let store = open_store(&database)?;

    let versions = store.applied_migrations().await?;
    let capabilities = store.detect_capabilities().await?;
    store.close().await;

    output_success(StatusReport {
        database,
        schema_version: versions.last().copied().unwrap_or(0),
        latest_version: Migrator::latest_version(),
        ordering: capabilities.ordering,
        tagging: capabilities.tagging,
        ordering_mode: config.ordering,
    })?;
    Ok(())
}
