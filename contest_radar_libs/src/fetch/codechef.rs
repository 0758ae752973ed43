//! Native CodeChef adapter: the public contest-list API for upcoming
//! contests, the profile page for handle existence.

use crate::cancel::CancelToken;
use crate::fetch::{check_status, with_cancel, FetchError, SourceAdapter};
use crate::platform::Platform;
use crate::types::RawRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const CONTEST_API_URL: &str = "https://www.codechef.com/api/list/contests/future";
const BASE_URL: &str = "https://www.codechef.com";

pub struct CodeChefAdapter {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ContestListResponse {
    #[serde(default)]
    future_contests: Vec<FutureContest>,
}

#[derive(Debug, Deserialize)]
struct FutureContest {
    contest_code: String,
    contest_name: String,
    contest_start_date_iso: Option<String>,
    contest_end_date_iso: Option<String>,
}

impl CodeChefAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn request_contests(&self) -> Result<Vec<RawRecord>, FetchError> {
        tracing::info!("requesting the CodeChef future-contest list");
        let response = self.client.get(CONTEST_API_URL).send().await?;
        check_status(response.status())?;
        let body: ContestListResponse = response.json().await?;

        let records = body
            .future_contests
            .into_iter()
            .map(|contest| RawRecord {
                url: Some(format!("{}/{}", BASE_URL, contest.contest_code)),
                name: Some(contest.contest_name),
                start: contest.contest_start_date_iso,
                end: contest.contest_end_date_iso,
                resource: Some(String::from("codechef.com")),
                description: None,
            })
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for CodeChefAdapter {
    fn platform(&self) -> Platform {
        Platform::CodeChef
    }

    async fn fetch_contests(&self, cancel: &CancelToken) -> Result<Vec<RawRecord>, FetchError> {
        with_cancel(cancel, self.request_contests()).await
    }

    async fn verify_handle(&self, handle: &str) -> Result<bool, FetchError> {
        let response = self
            .client
            .get(format!("{}/users/{}", BASE_URL, handle))
            .send()
            .await?;
        if response.status().is_client_error() {
            return Ok(false);
        }
        check_status(response.status())?;
        let body = response.text().await?;
        Ok(body.contains("user-details") && !body.contains("User not found"))
    }
}
