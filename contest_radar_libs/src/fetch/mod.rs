//! Source adapters: one implementation per external platform, all behind a
//! single capability trait. Shared concerns (retry, fallback ordering,
//! cancellation) are composed around adapters, never re-implemented inside
//! them.

pub mod atcoder;
pub mod clist;
pub mod codechef;
pub mod codeforces;
pub mod fallback;
pub mod leetcode;
pub mod profile;
pub mod retry;

use crate::cancel::CancelToken;
use crate::platform::Platform;
use crate::types::RawRecord;
use async_trait::async_trait;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Some upstreams reject the default reqwest user agent outright.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; contest-radar fetcher)";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code {0}")]
    Status(u16),
    #[error("rate limited by upstream")]
    RateLimited,
    #[error("failed to decode upstream payload: {0}")]
    Decode(String),
    #[error("page markup changed: {0}")]
    MarkupChanged(&'static str),
    #[error("call cancelled")]
    Cancelled,
}

/// Capability interface for one external source. Implementations are data:
/// the registry maps each [`Platform`] to its adapter and no other
/// polymorphism exists in the core.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetches the upcoming-contest listing as raw, unvalidated records.
    async fn fetch_contests(&self, cancel: &CancelToken) -> Result<Vec<RawRecord>, FetchError>;

    /// Answers "does this handle exist on the platform?".
    async fn verify_handle(&self, handle: &str) -> Result<bool, FetchError>;
}

/// Builds the shared HTTP client every adapter clones. One client, one
/// connection pool.
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    let client = Client::builder()
        .gzip(true)
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Races a fetch future against the cancellation token.
pub(crate) async fn with_cancel<T, F>(cancel: &CancelToken, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = fut => result,
    }
}

/// Maps a non-success response status to the matching error, singling out
/// rate-limit replies so the retry layer can apply its cooldown.
pub(crate) fn check_status(status: reqwest::StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else if status.as_u16() == 429 {
        Err(FetchError::RateLimited)
    } else {
        Err(FetchError::Status(status.as_u16()))
    }
}
