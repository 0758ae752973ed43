use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use contest_radar_libs::platform::Platform;
use contest_radar_libs::registry::AdapterRegistry;
use contest_radar_libs::verify::VerificationOrchestrator;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Platform identifier, e.g. "codeforces"
    platform: String,
    /// Handle to check
    handle: String,
}

pub async fn run(args: VerifyArgs) -> Result<()> {
    let config = Config::from_env()?;
    let platform = Platform::from_str(&args.platform)?;
    let registry = Arc::new(
        AdapterRegistry::build(&config.registry).context("couldn't build the adapter registry")?,
    );
    let orchestrator = VerificationOrchestrator::new(registry, config.max_concurrent);

    let exists = orchestrator.verify_one(platform, &args.handle).await;
    println!(
        "{}",
        serde_json::json!({
            "platform": platform.as_str(),
            "handle": args.handle,
            "exists": exists,
        })
    );

    Ok(())
}
