//! AtCoder adapter. There is no public contest API, so upcoming contests
//! are scraped from the English contest table; handle checks probe the user
//! profile page.

use crate::cancel::CancelToken;
use crate::fetch::{check_status, with_cancel, FetchError, SourceAdapter};
use crate::platform::Platform;
use crate::timeparse;
use crate::types::RawRecord;
use async_trait::async_trait;
use chrono::Duration;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

const CONTESTS_URL: &str = "https://atcoder.jp/contests/?lang=en";
const BASE_URL: &str = "https://atcoder.jp";

pub struct AtCoderAdapter {
    client: Client,
    upcoming_row: Selector,
    td: Selector,
    anchor: Selector,
}

impl AtCoderAdapter {
    pub fn new(client: Client) -> Self {
        let upcoming_row = Selector::parse("div#contest-table-upcoming tbody > tr").unwrap();
        let td = Selector::parse("td").unwrap();
        let anchor = Selector::parse("a").unwrap();
        Self {
            client,
            upcoming_row,
            td,
            anchor,
        }
    }

    /// Extracts raw records from the upcoming-contest table. Rows with
    /// unusable cells are skipped with a warning rather than failing the
    /// whole page.
    fn extract_contests(&self, html: &str) -> Result<Vec<RawRecord>, FetchError> {
        let document = Html::parse_document(html);
        let rows: Vec<ElementRef<'_>> = document.select(&self.upcoming_row).collect();
        if rows.is_empty() && !html.contains("contest-table-upcoming") {
            return Err(FetchError::MarkupChanged(
                "upcoming contest table not found on the contests page",
            ));
        }

        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let cells: Vec<ElementRef<'_>> = row.select(&self.td).collect();
            let start_text = cells
                .get(0)
                .and_then(|cell| cell.select(&self.anchor).next())
                .map(|a| a.text().collect::<String>())
                .map(|text| text.trim().to_string());
            let name_link = cells.get(1).and_then(|cell| cell.select(&self.anchor).next());
            let name = name_link.map(|a| a.text().collect::<String>().trim().to_string());
            let url = name_link
                .and_then(|a| a.value().attr("href"))
                .map(|href| format!("{}{}", BASE_URL, href));
            let duration_text = cells
                .get(2)
                .map(|cell| cell.text().collect::<String>().trim().to_string());

            let (start_text, duration_text) = match (start_text, duration_text) {
                (Some(start), Some(duration)) => (start, duration),
                _ => {
                    tracing::warn!(row = i, "skipping contest row with missing cells");
                    continue;
                }
            };

            // The table carries start + duration; derive the end instant so
            // the record arrives whole at the normalizer.
            let end = timeparse::parse_instant(&start_text, chrono::Utc::now())
                .ok()
                .and_then(|start| {
                    timeparse::parse_duration_minutes(&duration_text)
                        .ok()
                        .map(|minutes| start + Duration::minutes(minutes))
                })
                .map(|end| end.to_rfc3339());
            if end.is_none() {
                tracing::warn!(row = i, "skipping contest row with unparseable time cells");
                continue;
            }

            records.push(RawRecord {
                name,
                url,
                start: Some(start_text),
                end,
                resource: Some(String::from("atcoder.jp")),
                description: None,
            });
        }
        Ok(records)
    }

    async fn request_contests(&self) -> Result<Vec<RawRecord>, FetchError> {
        tracing::info!("scraping the AtCoder contests page");
        let response = self.client.get(CONTESTS_URL).send().await?;
        check_status(response.status())?;
        let html = response.text().await?;
        self.extract_contests(&html)
    }
}

#[async_trait]
impl SourceAdapter for AtCoderAdapter {
    fn platform(&self) -> Platform {
        Platform::AtCoder
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
        if response.status().as_u16() == 404 {
            return Ok(false);
        }
        check_status(response.status())?;
        let body = response.text().await?;
        Ok(body.contains("class=\"username\""))
    }
}
