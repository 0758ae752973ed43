use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use contest_radar_libs::cancel::CancelToken;
use contest_radar_libs::ingest::IngestionOrchestrator;
use contest_radar_libs::platform::Platform;
use contest_radar_libs::registry::AdapterRegistry;
use contest_radar_libs::store::MemoryStore;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Limit the run to a single platform
    #[arg(long)]
    platform: Option<String>,
}

pub async fn run(args: FetchArgs) -> Result<()> {
    let config = Config::from_env()?;
    let registry = Arc::new(
        AdapterRegistry::build(&config.registry).context("couldn't build the adapter registry")?,
    );
    let store = Arc::new(MemoryStore::new());
    let orchestrator = IngestionOrchestrator::new(
        registry,
        store,
        config.max_concurrent,
        config.retention_days,
    );
    let cancel = CancelToken::new();

    match args.platform {
        Some(name) => {
            let platform = Platform::from_str(&name)?;
            let summary = orchestrator.run_platform(platform, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        None => {
            let summary = orchestrator.run(&cancel).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
