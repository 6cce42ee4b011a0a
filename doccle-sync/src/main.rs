use anyhow::Result;
use clap::Parser;
use doccle_sync::cli::{run, Cli};
use doccle_sync::load_config::{load_config, resolve_log_dir};
use doccle_sync::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_path = telemetry::init(&resolve_log_dir(cli.config.as_deref()))?;
    tracing::info!(log_file = %log_path.display(), "CLI application startup: tracing initialised, environment loaded");

    let settings = match load_config(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.context("Failed to load configuration"));
        }
    };

    let result = run(cli, settings).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
