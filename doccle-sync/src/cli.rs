/// # doccle-sync CLI
///
/// Command parsing and orchestration for the `doccle-sync` binary. All
/// pipeline logic lives in `doccle-sync-core`; this module only wires the
/// concrete clients together from [`Settings`].
///
/// ## Commands
/// - `sync`: one pass of download, persist, ingest and archive, then exit.
/// - `serve`: poll on an interval and expose the health endpoint.
/// - `sweep`: re-ingest every PDF in a local directory.
///
/// For programmatic and integration use, call [`run`] with a parsed [`Cli`].
use crate::load_config::Settings;
use crate::schedule::run_schedule;
use crate::server::{serve, AppState};
use anyhow::Result;
use clap::{Parser, Subcommand};
use doccle_sync_core::download::DoccleClient;
use doccle_sync_core::runner::{RunStatus, SyncRunner};
use doccle_sync_core::sweep::sweep;
use doccle_sync_core::uploader::PaperlessClient;
use std::path::PathBuf;
use std::sync::Arc;

/// Forward Doccle documents into a Paperless instance.
#[derive(Parser)]
#[clap(
    name = "doccle-sync",
    version,
    about = "Fetch new Doccle documents, keep a local copy and forward them to Paperless"
)]
pub struct Cli {
    /// Optional YAML file with non-secret settings
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single synchronisation pass and exit
    Sync,
    /// Poll on the configured interval and serve the health endpoint
    Serve,
    /// Re-ingest every PDF file in a directory
    Sweep {
        /// Directory to sweep (defaults to the download directory)
        #[clap(long)]
        dir: Option<PathBuf>,
    },
}

fn build_runner(settings: &Settings) -> Result<Arc<SyncRunner>> {
    let source = DoccleClient::new(&settings.source_config()?)?;
    let ingestor = PaperlessClient::new(&settings.ingestion_config()?)?;
    Ok(Arc::new(SyncRunner::new(
        settings.synchronise_config(),
        Arc::new(source),
        Arc::new(ingestor),
    )))
}

/// Async entrypoint shared by `main` and the integration tests.
pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync => {
            tracing::info!(command = "sync", "Starting synchronisation process");
            let runner = build_runner(&settings)?;
            match runner.run_once().await {
                Ok(RunStatus::Completed(report)) => {
                    tracing::info!(
                        command = "sync",
                        forwarded = report.forwarded(),
                        failed = report.failed(),
                        "Synchronisation complete"
                    );
                    Ok(())
                }
                Ok(RunStatus::Skipped) => Ok(()),
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(e.into())
                }
            }
        }
        Commands::Serve => {
            let runner = build_runner(&settings)?;
            tracing::info!(
                command = "serve",
                bind = %settings.health_bind,
                interval_secs = settings.poll_interval.as_secs(),
                "Starting scheduled synchronisation"
            );
            let state = AppState::new(runner.clone());
            let bind = settings.health_bind.clone();
            let server = tokio::spawn(async move { serve(&bind, state).await });

            tokio::select! {
                _ = run_schedule(runner, settings.poll_interval) => Ok(()),
                joined = server => {
                    match joined {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(e),
                        Err(e) => Err(anyhow::anyhow!("Health server task failed: {e}")),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(command = "serve", "Interrupted, shutting down");
                    Ok(())
                }
            }
        }
        Commands::Sweep { dir } => {
            let ingestor = PaperlessClient::new(&settings.ingestion_config()?)?;
            let directory = dir.unwrap_or_else(|| settings.download_dir.clone());
            tracing::info!(command = "sweep", dir = %directory.display(), "Starting sweep");
            let report = sweep(&directory, &ingestor).await.map_err(|e| {
                anyhow::anyhow!("Cannot read directory {}: {e}", directory.display())
            })?;
            tracing::info!(
                command = "sweep",
                ingested = report.ingested.len(),
                failed = report.failed.len(),
                "Sweep complete"
            );
            Ok(())
        }
    }
}
