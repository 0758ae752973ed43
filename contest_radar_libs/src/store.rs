//! Persistence seam. The real document store lives outside this crate; the
//! core only depends on this trait. [`MemoryStore`] backs tests and the
//! default server wiring.

use crate::platform::Platform;
use crate::types::Contest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ContestStore: Send + Sync {
    /// Inserts or updates keyed on `(name, platform)`. An update replaces
    /// the mutable fields (url, times, duration, description, fetched_at)
    /// of the existing record.
    async fn upsert(&self, contest: Contest) -> Result<Contest, StoreError>;

    async fn find_by_key(
        &self,
        name: &str,
        platform: Platform,
    ) -> Result<Option<Contest>, StoreError>;

    /// All contests with a start time strictly after `now`, ordered by
    /// start time.
    async fn list_future(&self, now: DateTime<Utc>) -> Result<Vec<Contest>, StoreError>;

    /// Removes contests whose start time is older than `cutoff`, returning
    /// how many were deleted.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    contests: RwLock<HashMap<(String, Platform), Contest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.contests.read().await.len()
    }
}

#[async_trait]
impl ContestStore for MemoryStore {
    async fn upsert(&self, contest: Contest) -> Result<Contest, StoreError> {
        let mut contests = self.contests.write().await;
        contests.insert(contest.key(), contest.clone());
        Ok(contest)
    }

    async fn find_by_key(
        &self,
        name: &str,
        platform: Platform,
    ) -> Result<Option<Contest>, StoreError> {
        let contests = self.contests.read().await;
        Ok(contests.get(&(name.to_string(), platform)).cloned())
    }

    async fn list_future(&self, now: DateTime<Utc>) -> Result<Vec<Contest>, StoreError> {
        let contests = self.contests.read().await;
        let mut future: Vec<Contest> = contests
            .values()
            .filter(|contest| contest.start_time > now)
            .cloned()
            .collect();
        future.sort_by_key(|contest| contest.start_time);
        Ok(future)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut contests = self.contests.write().await;
        let before = contests.len();
        contests.retain(|_, contest| contest.start_time >= cutoff);
        Ok((before - contests.len()) as u64)
    }
}
