use clap::Parser;
use kanban_server::cli::Cli;
use kanban_server::handlers;
use kanban_server::output::output_error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = handlers::load_config(&cli)?;

    kanban_core::logging::init(config.log_level.as_deref().unwrap_or("info"))?;

    if let Err(e) = handlers::handle(cli, config).await {
        tracing::error!("{:#}", e);
        output_error(&format!("{:#}", e));
    }
    Ok(())
}
