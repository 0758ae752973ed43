//! Ingestion orchestrator: fans one fallback chain per platform out onto a
//! bounded worker pool, joins everything, normalizes, and hands the merged
//! batch to the store in a single pass. Platform failures are isolated; a
//! dead source shows up as a zero count in the run summary, never as an
//! aborted run.

use crate::cancel::CancelToken;
use crate::normalize;
use crate::platform::Platform;
use crate::registry::AdapterRegistry;
use crate::store::ContestStore;
use crate::types::Contest;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("an ingestion run is already in progress")]
    AlreadyRunning,
    #[error("ingestion run cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PlatformCounts {
    pub fetched: usize,
    pub rejected: usize,
}

/// End-of-run report: per-platform counts (zero-count platforms included so
/// callers can flag them), plus store-side failures surfaced as partial
/// failure rather than retried here.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_fetched: usize,
    pub per_platform: BTreeMap<Platform, PlatformCounts>,
    pub store_failures: usize,
    pub swept: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformRunSummary {
    pub platform: Platform,
    pub fetched: usize,
    pub rejected: usize,
    pub store_failures: usize,
    pub timestamp: DateTime<Utc>,
}

struct PlatformBatch {
    platform: Platform,
    counts: PlatformCounts,
    contests: Vec<Contest>,
}

pub struct IngestionOrchestrator {
    registry: Arc<AdapterRegistry>,
    store: Arc<dyn ContestStore>,
    pool: Arc<Semaphore>,
    run_lock: Mutex<()>,
    retention: Duration,
}

impl IngestionOrchestrator {
    pub fn new(
        registry: Arc<AdapterRegistry>,
        store: Arc<dyn ContestStore>,
        max_concurrent: usize,
        retention_days: i64,
    ) -> Self {
        Self {
            registry,
            store,
            pool: Arc::new(Semaphore::new(max_concurrent.max(1))),
            run_lock: Mutex::new(()),
            retention: Duration::days(retention_days),
        }
    }

    /// One full ingestion pass over every registered platform. Guarded:
    /// a concurrent trigger is rejected with [`IngestError::AlreadyRunning`]
    /// instead of interleaving upserts with the run in flight.
    pub async fn run(&self, cancel: &CancelToken) -> Result<RunSummary, IngestError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| IngestError::AlreadyRunning)?;

        let started_at = Utc::now();
        tracing::info!("starting ingestion run");

        let platforms = self.registry.platforms();
        let mut tasks = JoinSet::new();
        for platform in platforms.iter().copied() {
            let registry = self.registry.clone();
            let pool = self.pool.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                // The pool semaphore is never closed; ok() keeps the permit
                // alive for the duration of the fetch.
                let _permit = pool.acquire_owned().await.ok();
                fetch_platform_batch(&registry, platform, &cancel).await
            });
        }

        let mut per_platform: BTreeMap<Platform, PlatformCounts> = BTreeMap::new();
        let mut merged: HashMap<(String, Platform), Contest> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(batch) => {
                    per_platform.insert(batch.platform, batch.counts);
                    for contest in batch.contests {
                        merged.insert(contest.key(), contest);
                    }
                }
                Err(error) => {
                    tracing::error!(%error, "platform fetch task panicked");
                }
            }
        }
        // A panicked task never reported its batch; it still belongs in the
        // summary as a zero-count platform.
        for platform in platforms {
            per_platform.entry(platform).or_default();
        }

        if cancel.is_cancelled() {
            tracing::info!("ingestion run cancelled before persisting");
            return Err(IngestError::Cancelled);
        }

        let total_fetched = merged.len();
        let mut store_failures = 0usize;
        for contest in merged.into_values() {
            if let Err(error) = self.store.upsert(contest).await {
                tracing::error!(%error, "contest upsert failed");
                store_failures += 1;
            }
        }

        let cutoff = started_at - self.retention;
        let swept = match self.store.delete_older_than(cutoff).await {
            Ok(swept) => swept,
            Err(error) => {
                tracing::error!(%error, "retention sweep failed");
                store_failures += 1;
                0
            }
        };

        for (platform, counts) in &per_platform {
            if counts.fetched == 0 {
                tracing::warn!(platform = %platform, "platform contributed zero contests this run");
            }
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            total_fetched,
            per_platform,
            store_failures,
            swept,
        };
        tracing::info!(
            total = summary.total_fetched,
            store_failures = summary.store_failures,
            swept = summary.swept,
            "ingestion run finished"
        );
        Ok(summary)
    }

    /// Fetches and persists one platform on demand. Shares the run guard so
    /// it cannot interleave with a full run.
    pub async fn run_platform(
        &self,
        platform: Platform,
        cancel: &CancelToken,
    ) -> Result<PlatformRunSummary, IngestError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| IngestError::AlreadyRunning)?;

        let batch = fetch_platform_batch(&self.registry, platform, cancel).await;
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let mut store_failures = 0usize;
        for contest in batch.contests {
            if let Err(error) = self.store.upsert(contest).await {
                tracing::error!(%error, "contest upsert failed");
                store_failures += 1;
            }
        }
        Ok(PlatformRunSummary {
            platform,
            fetched: batch.counts.fetched,
            rejected: batch.counts.rejected,
            store_failures,
            timestamp: Utc::now(),
        })
    }
}

async fn fetch_platform_batch(
    registry: &AdapterRegistry,
    platform: Platform,
    cancel: &CancelToken,
) -> PlatformBatch {
    let raw_records = match registry.chain(platform) {
        Some(chain) => chain.fetch(cancel).await,
        None => Vec::new(),
    };

    let now = Utc::now();
    let mut contests = Vec::with_capacity(raw_records.len());
    let mut rejected = 0usize;
    for raw in &raw_records {
        match normalize::normalize(raw, platform, now) {
            Ok(contest) => contests.push(contest),
            Err(rejection) => {
                rejected += 1;
                tracing::debug!(platform = %platform, %rejection, "record rejected");
            }
        }
    }
    if rejected > 0 {
        tracing::info!(
            platform = %platform,
            rejected,
            accepted = contests.len(),
            "normalization dropped records"
        );
    }

    PlatformBatch {
        platform,
        counts: PlatformCounts {
            fetched: contests.len(),
            rejected,
        },
        contests,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fetch::fallback::FallbackChain;
    use crate::fetch::retry::RetryPolicy;
    use crate::fetch::{FetchError, SourceAdapter};
    use crate::store::MemoryStore;
    use crate::types::RawRecord;
    use async_trait::async_trait;
    use std::time::Duration as StdDuration;
    use tokio::sync::Notify;

    struct ScriptedAdapter {
        platform: Platform,
        records: Vec<RawRecord>,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl SourceAdapter for ScriptedAdapter {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn fetch_contests(
            &self,
            _cancel: &CancelToken,
        ) -> Result<Vec<RawRecord>, FetchError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                Err(FetchError::Status(503))
            } else {
                Ok(self.records.clone())
            }
        }

        async fn verify_handle(&self, _handle: &str) -> Result<bool, FetchError> {
            Ok(false)
        }
    }

    fn record(name: &str, start: &str, end: &str) -> RawRecord {
        RawRecord {
            name: Some(name.to_string()),
            url: Some(format!("https://example.com/{}", name)),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            resource: None,
            description: None,
        }
    }

    fn future_records(count: usize) -> Vec<RawRecord> {
        (0..count)
            .map(|i| {
                record(
                    &format!("Round {}", i),
                    "2099-01-01T10:00:00",
                    "2099-01-01T12:00:00",
                )
            })
            .collect()
    }

    fn registry_of(adapters: Vec<ScriptedAdapter>) -> Arc<AdapterRegistry> {
        let retry = RetryPolicy::new(1, StdDuration::from_millis(1), StdDuration::from_millis(1));
        let mut chains = HashMap::new();
        let mut verifiers: HashMap<Platform, Arc<dyn SourceAdapter>> = HashMap::new();
        for adapter in adapters {
            let platform = adapter.platform;
            let adapter: Arc<dyn SourceAdapter> = Arc::new(adapter);
            chains.insert(
                platform,
                FallbackChain::new(platform, retry.clone()).with_strategy("scripted", adapter.clone()),
            );
            verifiers.insert(platform, adapter);
        }
        Arc::new(AdapterRegistry::from_parts(chains, verifiers))
    }

    fn orchestrator(
        registry: Arc<AdapterRegistry>,
        store: Arc<MemoryStore>,
    ) -> IngestionOrchestrator {
        IngestionOrchestrator::new(registry, store, 10, 30)
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let registry = registry_of(vec![
            ScriptedAdapter {
                platform: Platform::Codeforces,
                records: Vec::new(),
                fail: true,
                gate: None,
            },
            ScriptedAdapter {
                platform: Platform::LeetCode,
                records: future_records(5),
                fail: false,
                gate: None,
            },
        ]);
        let store = Arc::new(MemoryStore::new());
        let summary = orchestrator(registry, store.clone())
            .run(&CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.total_fetched, 5);
        assert_eq!(summary.per_platform[&Platform::Codeforces].fetched, 0);
        assert_eq!(summary.per_platform[&Platform::LeetCode].fetched, 5);
        assert_eq!(summary.store_failures, 0);
        assert_eq!(store.len().await, 5);
    }

    struct PanickingAdapter {
        platform: Platform,
    }

    #[async_trait]
    impl SourceAdapter for PanickingAdapter {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn fetch_contests(
            &self,
            _cancel: &CancelToken,
        ) -> Result<Vec<RawRecord>, FetchError> {
            panic!("adapter blew up");
        }

        async fn verify_handle(&self, _handle: &str) -> Result<bool, FetchError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_panicked_platform_appears_with_zero_counts() {
        let retry = RetryPolicy::new(1, StdDuration::from_millis(1), StdDuration::from_millis(1));
        let mut chains = HashMap::new();
        let mut verifiers: HashMap<Platform, Arc<dyn SourceAdapter>> = HashMap::new();

        let panicking: Arc<dyn SourceAdapter> = Arc::new(PanickingAdapter {
            platform: Platform::Codeforces,
        });
        chains.insert(
            Platform::Codeforces,
            FallbackChain::new(Platform::Codeforces, retry.clone())
                .with_strategy("scripted", panicking.clone()),
        );
        verifiers.insert(Platform::Codeforces, panicking);

        let healthy: Arc<dyn SourceAdapter> = Arc::new(ScriptedAdapter {
            platform: Platform::LeetCode,
            records: future_records(2),
            fail: false,
            gate: None,
        });
        chains.insert(
            Platform::LeetCode,
            FallbackChain::new(Platform::LeetCode, retry).with_strategy("scripted", healthy.clone()),
        );
        verifiers.insert(Platform::LeetCode, healthy);

        let registry = Arc::new(AdapterRegistry::from_parts(chains, verifiers));
        let store = Arc::new(MemoryStore::new());
        let summary = orchestrator(registry, store.clone())
            .run(&CancelToken::new())
            .await
            .unwrap();

        let counts = summary.per_platform[&Platform::Codeforces];
        assert_eq!(counts.fetched, 0);
        assert_eq!(counts.rejected, 0);
        assert_eq!(summary.per_platform[&Platform::LeetCode].fetched, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_rejections_are_counted_not_fatal() {
        let mut records = future_records(2);
        // End before start: rejected, batch continues.
        records.push(record("Backwards", "2099-01-01T12:00:00", "2099-01-01T10:00:00"));
        let registry = registry_of(vec![ScriptedAdapter {
            platform: Platform::Codeforces,
            records,
            fail: false,
            gate: None,
        }]);
        let store = Arc::new(MemoryStore::new());
        let summary = orchestrator(registry, store.clone())
            .run(&CancelToken::new())
            .await
            .unwrap();

        let counts = summary.per_platform[&Platform::Codeforces];
        assert_eq!(counts.fetched, 2);
        assert_eq!(counts.rejected, 1);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_second_observation_updates_not_duplicates() {
        let store = Arc::new(MemoryStore::new());

        let first = registry_of(vec![ScriptedAdapter {
            platform: Platform::Codeforces,
            records: vec![record("Round 1", "2099-01-01T10:00:00", "2099-01-01T12:00:00")],
            fail: false,
            gate: None,
        }]);
        orchestrator(first, store.clone())
            .run(&CancelToken::new())
            .await
            .unwrap();

        let mut moved = record("Round 1", "2099-01-02T10:00:00", "2099-01-02T12:00:00");
        moved.url = Some(String::from("https://example.com/rescheduled"));
        let second = registry_of(vec![ScriptedAdapter {
            platform: Platform::Codeforces,
            records: vec![moved],
            fail: false,
            gate: None,
        }]);
        orchestrator(second, store.clone())
            .run(&CancelToken::new())
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let stored = store
            .find_by_key("Round 1", Platform::Codeforces)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.url, "https://example.com/rescheduled");
    }

    #[tokio::test]
    async fn test_future_only_invariant_holds_for_stored_contests() {
        let mut records = future_records(1);
        records.push(record("Long Gone", "2020-01-01T10:00:00", "2020-01-01T12:00:00"));
        let registry = registry_of(vec![ScriptedAdapter {
            platform: Platform::AtCoder,
            records,
            fail: false,
            gate: None,
        }]);
        let store = Arc::new(MemoryStore::new());
        let run_instant = Utc::now();
        orchestrator(registry, store.clone())
            .run(&CancelToken::new())
            .await
            .unwrap();

        let stored = store.list_future(run_instant).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.iter().all(|c| c.start_time > run_instant));
    }

    #[tokio::test]
    async fn test_concurrent_trigger_is_rejected() {
        let gate = Arc::new(Notify::new());
        let registry = registry_of(vec![ScriptedAdapter {
            platform: Platform::Codeforces,
            records: future_records(1),
            fail: false,
            gate: Some(gate.clone()),
        }]);
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Arc::new(IngestionOrchestrator::new(registry, store, 10, 30));

        let running = orchestrator.clone();
        let first = tokio::spawn(async move { running.run(&CancelToken::new()).await });
        // Give the first run time to take the guard.
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        let second = orchestrator.run(&CancelToken::new()).await;
        assert!(matches!(second, Err(IngestError::AlreadyRunning)));

        gate.notify_waiters();
        let summary = first.await.unwrap().unwrap();
        assert_eq!(summary.total_fetched, 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_does_not_persist() {
        let registry = registry_of(vec![ScriptedAdapter {
            platform: Platform::Codeforces,
            records: future_records(3),
            fail: false,
            gate: None,
        }]);
        let store = Arc::new(MemoryStore::new());
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = orchestrator(registry, store.clone()).run(&cancel).await;
        assert!(matches!(result, Err(IngestError::Cancelled)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_run_platform_only_touches_one_platform() {
        let registry = registry_of(vec![
            ScriptedAdapter {
                platform: Platform::Codeforces,
                records: future_records(2),
                fail: false,
                gate: None,
            },
            ScriptedAdapter {
                platform: Platform::LeetCode,
                records: future_records(4),
                fail: false,
                gate: None,
            },
        ]);
        let store = Arc::new(MemoryStore::new());
        let summary = orchestrator(registry, store.clone())
            .run_platform(Platform::Codeforces, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.platform, Platform::Codeforces);
        assert_eq!(summary.fetched, 2);
        assert_eq!(store.len().await, 2);
    }
}
