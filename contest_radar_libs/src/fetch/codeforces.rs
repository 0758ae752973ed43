//! Native Codeforces adapter: `contest.list` for upcoming contests and
//! `user.info` for handle existence.

use crate::cancel::CancelToken;
use crate::fetch::{check_status, with_cancel, FetchError, SourceAdapter};
use crate::platform::Platform;
use crate::types::RawRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const API_BASE: &str = "https://codeforces.com/api";
const CONTEST_BASE: &str = "https://codeforces.com/contests";

pub struct CodeforcesAdapter {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiContest {
    id: i64,
    name: String,
    phase: String,
    start_time_seconds: Option<i64>,
    duration_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    #[allow(dead_code)]
    handle: String,
}

impl CodeforcesAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn request_contests(&self) -> Result<Vec<RawRecord>, FetchError> {
        tracing::info!("requesting contest.list from the Codeforces API");
        let response = self
            .client
            .get(format!("{}/contest.list", API_BASE))
            .send()
            .await?;
        check_status(response.status())?;
        let body: ApiResponse<ApiContest> = response.json().await?;
        if body.status != "OK" {
            return Err(FetchError::Decode(format!(
                "contest.list returned status {:?}",
                body.status
            )));
        }

        let records = body
            .result
            .into_iter()
            .filter(|contest| contest.phase == "BEFORE")
            .filter_map(|contest| {
                let start = contest.start_time_seconds?;
                let end = start + contest.duration_seconds?;
                Some(RawRecord {
                    name: Some(contest.name),
                    url: Some(format!("{}/{}", CONTEST_BASE, contest.id)),
                    start: Some(start.to_string()),
                    end: Some(end.to_string()),
                    resource: Some(String::from("codeforces.com")),
                    description: None,
                })
            })
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for CodeforcesAdapter {
    fn platform(&self) -> Platform {
        Platform::Codeforces
    }

    async fn fetch_contests(&self, cancel: &CancelToken) -> Result<Vec<RawRecord>, FetchError> {
        with_cancel(cancel, self.request_contests()).await
    }

    async fn verify_handle(&self, handle: &str) -> Result<bool, FetchError> {
        let response = self
            .client
            .get(format!("{}/user.info", API_BASE))
            .query(&[("handles", handle)])
            .send()
            .await?;
        // user.info answers 400 with status FAILED for an unknown handle.
        if response.status().as_u16() == 400 {
            return Ok(false);
        }
        check_status(response.status())?;
        let body: ApiResponse<ApiUser> = response.json().await?;
        Ok(body.status == "OK" && !body.result.is_empty())
    }
}
