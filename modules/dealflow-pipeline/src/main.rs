use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dealflow_common::Platform;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dealflow_pipeline::intake::{ingest, read_captured};
use dealflow_pipeline::{AppConfig, Classifier, DealStore, Pipeline};

#[derive(Parser)]
#[command(name = "dealflow", about = "Deal link normalization and catalog builder")]
struct Cli {
    /// Directory holding deals_raw.json and deals.json (overrides DEALFLOW_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process the intake batch into the catalog
    Run,
    /// Add captured deals from a JSON file to the intake buffer
    Ingest {
        /// JSON array of captured deals
        file: PathBuf,
    },
    /// Show how a single link is resolved, classified, and converted
    Convert {
        url: String,
        /// Platform hint, e.g. "amazon"
        #[arg(long)]
        platform: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dealflow=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    config.log_keys();

    let store = DealStore::new(&config.data_dir);

    match cli.command {
        Command::Run => {
            let pipeline = Pipeline::new(store, Classifier::standard()?, config.converter()?);
            let stats = pipeline.run().await.context("Pipeline run failed")?;
            info!("Pipeline run complete. {stats}");
        }
        Command::Ingest { file } => {
            let records = read_captured(&file)
                .with_context(|| format!("Failed to read captured deals from {}", file.display()))?;
            let stats = ingest(&store, records, Utc::now())?;
            info!("Ingest complete. {stats}");
        }
        Command::Convert { url, platform } => {
            let hint = platform.as_deref().map(Platform::from_key).unwrap_or_default();
            let pipeline = Pipeline::new(store, Classifier::standard()?, config.converter()?);
            let deal = dealflow_common::Deal {
                id: String::new(),
                title: String::new(),
                image: String::new(),
                price: String::new(),
                mrp: String::new(),
                discount: String::new(),
                platform: hint,
                original_link: url,
                timestamp: Utc::now(),
            };
            let out = pipeline.process(deal).await;
            println!("raw:       {}", out.trail.raw);
            println!("resolved:  {}", out.trail.resolved);
            println!("platform:  {}", out.deal.platform);
            println!("affiliate: {}", out.trail.affiliate);
            println!("method:    {:?}", out.method);
        }
    }

    Ok(())
}
