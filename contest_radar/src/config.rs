use anyhow::{Context, Result};
use contest_radar_libs::fetch::clist::ClistCredentials;
use contest_radar_libs::fetch::retry::RetryPolicy;
use contest_radar_libs::registry::RegistryConfig;
use std::env;
use std::time::Duration;

const DEFAULT_CLIST_API_URL: &str = "https://clist.by/api/v4";

#[derive(Debug, Clone)]
pub struct Config {
    pub registry: RegistryConfig,
    pub fetch_interval: Duration,
    pub retention_days: i64,
    pub max_concurrent: usize,
    pub port: u16,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("couldn't parse {} value {:?}", name, value)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let clist = match (env::var("CLIST_USERNAME"), env::var("CLIST_API_KEY")) {
            (Ok(username), Ok(api_key)) => Some(ClistCredentials {
                api_url: env::var("CLIST_API_URL").unwrap_or_else(|_| {
                    String::from(DEFAULT_CLIST_API_URL)
                }),
                username,
                api_key,
            }),
            _ => {
                tracing::warn!(
                    "CLIST_USERNAME / CLIST_API_KEY are not set; the clist strategy is disabled"
                );
                None
            }
        };

        let http_timeout = Duration::from_secs(env_parsed("HTTP_TIMEOUT_SECS", 30u64)?);
        let fetch_interval_hours: u64 = env_parsed("FETCH_INTERVAL_HOURS", 4u64)?;
        let retention_days: i64 = env_parsed("RETENTION_DAYS", 30i64)?;
        let max_concurrent: usize = env_parsed("MAX_CONCURRENT_FETCHES", 10usize)?;
        let port: u16 = env_parsed("PORT", 8000u16).context("invalid PORT value")?;

        Ok(Self {
            registry: RegistryConfig {
                clist,
                http_timeout,
                retry: RetryPolicy::default(),
            },
            fetch_interval: Duration::from_secs(fetch_interval_hours * 3600),
            retention_days,
            max_concurrent,
            port,
        })
    }
}
