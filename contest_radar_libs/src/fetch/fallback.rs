//! Ordered fallback over the candidate fetch strategies for one platform.
//! Strategies run strictly in priority order; a later one is only attempted
//! after an earlier one failed or came back empty. An exhausted chain is an
//! empty result, never an error, so one dead platform cannot abort a run.

use crate::cancel::CancelToken;
use crate::fetch::retry::RetryPolicy;
use crate::fetch::SourceAdapter;
use crate::platform::Platform;
use crate::types::RawRecord;
use std::sync::Arc;

pub struct FetchStrategy {
    pub name: &'static str,
    adapter: Arc<dyn SourceAdapter>,
}

pub struct FallbackChain {
    platform: Platform,
    strategies: Vec<FetchStrategy>,
    retry: RetryPolicy,
}

impl FallbackChain {
    pub fn new(platform: Platform, retry: RetryPolicy) -> Self {
        Self {
            platform,
            strategies: Vec::new(),
            retry,
        }
    }

    pub fn with_strategy(mut self, name: &'static str, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.strategies.push(FetchStrategy { name, adapter });
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Walks the strategy list until one yields at least one record. Each
    /// inner call goes through the retry policy.
    pub async fn fetch(&self, cancel: &CancelToken) -> Vec<RawRecord> {
        for strategy in &self.strategies {
            if cancel.is_cancelled() {
                tracing::info!(platform = %self.platform, "fetch cancelled, abandoning chain");
                return Vec::new();
            }
            let outcome = self
                .retry
                .run(cancel, || strategy.adapter.fetch_contests(cancel))
                .await;
            match outcome {
                Ok(records) if !records.is_empty() => {
                    tracing::info!(
                        platform = %self.platform,
                        strategy = strategy.name,
                        count = records.len(),
                        "strategy yielded records"
                    );
                    return records;
                }
                Ok(_) => {
                    tracing::info!(
                        platform = %self.platform,
                        strategy = strategy.name,
                        "strategy returned no records, moving to next"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        platform = %self.platform,
                        strategy = strategy.name,
                        %error,
                        "strategy failed, moving to next"
                    );
                }
            }
        }
        tracing::warn!(
            platform = %self.platform,
            "all fetch strategies exhausted, contributing zero records"
        );
        Vec::new()
    }
}
