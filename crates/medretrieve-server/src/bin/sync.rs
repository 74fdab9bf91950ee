//! `medretrieve-sync`: drives the Sync Engine's `init` / `build` / `sync` /
//! `stats` modes from an external scheduler (cron, systemd timer), per §4.4.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use medretrieve_core::config::Config;
use medretrieve_core::store::{PgStore, Store};
use medretrieve_core::sync::SyncEngine;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "medretrieve-sync", about = "Incremental entity extraction runner")]
struct Cli {
    #[arg(long, env = "MEDRETRIEVE_CONFIG")]
    config: std::path::PathBuf,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Create schema idempotently.
    Init,
    /// Extract entities for every document.
    Build,
    /// Extract entities only for documents modified since the watermark.
    Sync,
    /// Print watermark and entity totals.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    let store: Arc<dyn Store> = Arc::new(
        PgStore::connect(&config.store.dsn, config.store.pool_size, config.embedding.dimension).await?,
    );
    let engine = SyncEngine::new(store, config.sync.batch_window);

    match cli.mode {
        Mode::Init => {
            engine.init().await?;
            info!("schema ready");
        }
        Mode::Build => {
            let report = engine.build().await?;
            info!(processed = report.processed, failed = report.failed.len(), "build complete");
        }
        Mode::Sync => {
            let report = engine.sync().await?;
            info!(processed = report.processed, failed = report.failed.len(), "sync complete");
        }
        Mode::Stats => {
            let stats = engine.stats().await?;
            println!(
                "watermark: {}\ntotal_entities: {}",
                stats
                    .watermark
                    .map(|w| w.to_rfc3339())
                    .unwrap_or_else(|| "none".to_string()),
                stats.total_entities
            );
        }
    }

    Ok(())
}
