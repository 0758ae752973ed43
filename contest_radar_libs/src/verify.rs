//! Concurrent handle verification across platforms. One adapter call per
//! configured handle, joined into a status map. A platform with no handle
//! configured is simply absent from the map, so callers can tell "not
//! configured" apart from "checked and absent"; a failed check is `false`,
//! never an error.

use crate::platform::Platform;
use crate::registry::AdapterRegistry;
use crate::types::VerificationResult;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub struct VerificationOrchestrator {
    registry: Arc<AdapterRegistry>,
    pool: Arc<Semaphore>,
}

impl VerificationOrchestrator {
    pub fn new(registry: Arc<AdapterRegistry>, max_concurrent: usize) -> Self {
        Self {
            registry,
            pool: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Checks a single handle on a single platform. Any failure (timeout,
    /// non-200, parse miss, unknown platform) collapses to `false`.
    pub async fn verify_one(&self, platform: Platform, handle: &str) -> bool {
        let handle = handle.trim();
        if handle.is_empty() {
            return false;
        }
        let adapter = match self.registry.verifier(platform) {
            Some(adapter) => adapter.clone(),
            None => {
                tracing::warn!(platform = %platform, "no verifier registered");
                return false;
            }
        };
        let _permit = self.pool.acquire().await.ok();
        match adapter.verify_handle(handle).await {
            Ok(exists) => {
                tracing::info!(platform = %platform, handle, exists, "handle checked");
                exists
            }
            Err(error) => {
                tracing::warn!(platform = %platform, handle, %error, "handle check failed");
                false
            }
        }
    }

    /// Fans out one check per configured handle and joins them all. Empty
    /// or whitespace handles are skipped entirely.
    pub async fn verify_all(
        &self,
        handles: &HashMap<Platform, String>,
    ) -> HashMap<Platform, bool> {
        let checks = handles
            .iter()
            .filter(|(_, handle)| !handle.trim().is_empty())
            .map(|(&platform, handle)| {
                let handle = handle.trim().to_string();
                async move {
                    let exists = self.verify_one(platform, &handle).await;
                    VerificationResult {
                        platform,
                        handle,
                        exists,
                    }
                }
            });

        join_all(checks)
            .await
            .into_iter()
            .map(|result| (result.platform, result.exists))
            .collect()
    }
}
