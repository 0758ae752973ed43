mod cmd;
mod config;
mod modules;

use crate::cmd::{
    fetch::{self, FetchArgs},
    server::{self, ServerArgs},
    verify::{self, VerifyArgs},
};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{env, str::FromStr};
use tokio::runtime::Builder;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{self, time::OffsetTime},
};

#[derive(Debug, Parser)]
#[command(name = "contest_radar")]
#[command(about = "Contest Radar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one ingestion pass and print the summary
    Fetch(FetchArgs),
    /// Check whether a handle exists on a platform
    Verify(VerifyArgs),
    /// Serve the HTTP API with the scheduled fetch loop
    Server(ServerArgs),
}

fn main() {
    dotenv().ok();

    let log_level = env::var("RUST_LOG").unwrap_or(String::from("info"));
    let filter = EnvFilter::builder()
        .with_default_directive(
            LevelFilter::from_str(&log_level)
                .expect("couldn't parse specified log level")
                .into(),
        )
        .from_env_lossy();
    let format = fmt::format()
        .with_level(true)
        .with_target(true)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_timer(OffsetTime::local_rfc_3339().unwrap());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(format)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let runtime = Builder::new_multi_thread().enable_all().build().unwrap();

    match Cli::parse().command {
        Commands::Fetch(args) => runtime.block_on(fetch::run(args)),
        Commands::Verify(args) => runtime.block_on(verify::run(args)),
        Commands::Server(args) => runtime.block_on(server::run(args)),
    }
    .expect("command failed");
}
