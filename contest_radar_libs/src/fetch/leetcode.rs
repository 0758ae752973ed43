//! Native LeetCode adapter. Both operations go through the GraphQL
//! endpoint: `allContests` for listings, `matchedUser` for handle checks.

use crate::cancel::CancelToken;
use crate::fetch::{check_status, with_cancel, FetchError, SourceAdapter};
use crate::platform::Platform;
use crate::types::RawRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const GRAPHQL_URL: &str = "https://leetcode.com/graphql";
const CONTEST_BASE: &str = "https://leetcode.com/contest";

const CONTESTS_QUERY: &str =
    "query contestList { allContests { title titleSlug startTime duration isVirtual } }";
const USER_QUERY: &str =
    "query userPublicProfile($username: String!) { matchedUser(username: $username) { username } }";

pub struct LeetCodeAdapter {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContestData {
    #[serde(default)]
    all_contests: Vec<GraphqlContest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlContest {
    title: String,
    title_slug: String,
    start_time: i64,
    duration: i64,
    #[serde(default)]
    is_virtual: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserData {
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
struct MatchedUser {
    #[allow(dead_code)]
    username: String,
}

impl LeetCodeAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn request_contests(&self) -> Result<Vec<RawRecord>, FetchError> {
        tracing::info!("requesting contest list from the LeetCode GraphQL endpoint");
        let response = self
            .client
            .post(GRAPHQL_URL)
            .header("Referer", "https://leetcode.com/")
            .json(&json!({ "query": CONTESTS_QUERY, "variables": {} }))
            .send()
            .await?;
        check_status(response.status())?;
        let body: GraphqlResponse<ContestData> = response.json().await?;
        let data = body
            .data
            .ok_or_else(|| FetchError::Decode(String::from("allContests payload missing")))?;

        let records = data
            .all_contests
            .into_iter()
            .filter(|contest| !contest.is_virtual)
            .map(|contest| RawRecord {
                url: Some(format!("{}/{}", CONTEST_BASE, contest.title_slug)),
                name: Some(contest.title),
                start: Some(contest.start_time.to_string()),
                end: Some((contest.start_time + contest.duration).to_string()),
                resource: Some(String::from("leetcode.com")),
                description: None,
            })
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for LeetCodeAdapter {
    fn platform(&self) -> Platform {
        Platform::LeetCode
    }

    async fn fetch_contests(&self, cancel: &CancelToken) -> Result<Vec<RawRecord>, FetchError> {
        with_cancel(cancel, self.request_contests()).await
    }

    async fn verify_handle(&self, handle: &str) -> Result<bool, FetchError> {
        let response = self
            .client
            .post(GRAPHQL_URL)
            .header("Referer", "https://leetcode.com/")
            .json(&json!({
                "query": USER_QUERY,
                "variables": { "username": handle },
            }))
            .send()
            .await?;
        check_status(response.status())?;
        let body: GraphqlResponse<UserData> = response.json().await?;
        Ok(body
            .data
            .map(|data| data.matched_user.is_some())
            .unwrap_or(false))
    }
}
