use crate::platform::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical contest record. Identity is the `(name, platform)` pair; a
/// second observation of the same pair updates the mutable fields instead of
/// creating a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    pub name: String,
    pub platform: Platform,
    pub url: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub description: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl Contest {
    pub fn key(&self) -> (String, Platform) {
        (self.name.clone(), self.platform)
    }
}

/// Unvalidated field bag produced by a source adapter. Lives for one
/// ingestion pass only and is never persisted; everything in here is a raw
/// string until the normalizer has had its say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub url: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub resource: Option<String>,
    pub description: Option<String>,
}

/// Outcome of a single handle-existence check. Ephemeral; callers aggregate
/// these into a per-user status map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub platform: Platform,
    pub handle: String,
    pub exists: bool,
}
