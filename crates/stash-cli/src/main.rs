//! stash: ingest local images into the file store.
//!
//! Configuration comes from the environment (and `.env`); see `IngestConfig::from_env`.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use stash_cli::{build_uploader, open_repository, original_name};
use stash_core::{ErrorMetadata, IngestConfig};
use stash_infra::{init_telemetry, shutdown_telemetry, TelemetryConfig};
use stash_processing::{IngestOrchestrator, IngestRequest, PipelineKind};
use stash_storage::StagingArea;

#[derive(Parser)]
#[command(name = "stash", about = "File ingestion and thumbnail pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a local image
    Ingest {
        /// Path to the image
        path: PathBuf,
        /// Upload to remote object storage instead of generating a local thumbnail
        #[arg(long)]
        remote: bool,
        /// Owner id recorded on the file
        #[arg(long)]
        owner: Option<i64>,
        /// Remote tag (repeatable); defaults to the configured tag
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show a stored file record
    Get {
        /// File record id
        id: i64,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize record")?;
    println!("{}", out);
    Ok(())
}

async fn run(cli: Cli, config: IngestConfig) -> anyhow::Result<()> {
    let repository = open_repository(&config.database).await?;

    match cli.command {
        Commands::Ingest {
            path,
            remote,
            owner,
            tags,
        } => {
            let kind = if remote {
                PipelineKind::Remote
            } else {
                PipelineKind::Local
            };

            let staging = StagingArea::new(config.upload_dir.clone())
                .await
                .context("Failed to open upload directory")?;
            let upload = staging
                .land(&path, &original_name(&path)?)
                .await
                .with_context(|| format!("Failed to stage {}", path.display()))?;

            let uploader = build_uploader(&config.remote)?;
            let orchestrator = IngestOrchestrator::build(config, repository, uploader)
                .await
                .context("Failed to set up ingestion")?;

            let mut request = IngestRequest::new(upload);
            request.owner_id = owner;
            if !tags.is_empty() {
                request = request.with_tags(tags);
            }

            match orchestrator.ingest(kind, request).await {
                Ok(record) => print_json(&record)?,
                Err(e) => {
                    return Err(anyhow::anyhow!(
                        "{} ({}): {}",
                        e.client_message(),
                        e.error_code(),
                        e.detailed_message()
                    ))
                }
            }
        }
        Commands::Get { id } => {
            let record = repository
                .get(id)
                .await
                .with_context(|| format!("Failed to load file record {}", id))?
                .with_context(|| format!("File record {} not found", id))?;
            print_json(&record)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = IngestConfig::from_env().context("Invalid configuration")?;

    let telemetry = TelemetryConfig::new("stash", config.environment.clone()).with_format_from_env();
    init_telemetry(&telemetry)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let result = run(cli, config).await;
    shutdown_telemetry().await;
    result
}
