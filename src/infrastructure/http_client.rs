//! HTTP fetching with per-query session state and page stitching.
//!
//! The search platform paginates statefully: after the initial search
//! request, follow-up pages are addressed only by page number and resolved
//! against server-side session state. Every logical query therefore gets
//! its own cookie-jar client, and follow-up pages are fetched sequentially
//! on that session, never in parallel or through a fresh client.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};
use url::Url;

use crate::domain::constants::site;
use crate::domain::pagination;
use crate::infrastructure::config::HarvestConfig;

static TOTAL_RECORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"totalRecords\s*:\s*(\d+)").unwrap());

/// All pages of one logical query, concatenated in fetch order.
///
/// Record markers are distributed across pages, so extraction always runs
/// over the combined document.
#[derive(Debug, Clone)]
pub struct StitchedPages {
    pub html: String,
    pub total_records: u32,
    /// The reported total sat at the platform's silent cap; results are
    /// incomplete and the true count is unknown.
    pub truncated: bool,
}

/// Fetch seam for one logical query. The engine's processors depend on
/// this trait so tests can substitute canned documents for the network.
#[async_trait]
pub trait QueryFetcher: Send + Sync {
    async fn fetch_query(&self, url: &str) -> Result<StitchedPages>;
}

/// Real fetcher backed by reqwest.
pub struct SearchSession {
    timeout: Duration,
    user_agent: String,
}

impl SearchSession {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::new(
            Duration::from_secs(config.request_timeout_seconds),
            config.user_agent.clone(),
        )
    }

    // One cookie-jar client per logical query; page switching is stateful
    // relative to the initial search request.
    fn session_client(&self) -> Result<Client> {
        ClientBuilder::new()
            .cookie_store(true)
            .gzip(true)
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .context("failed to build HTTP client")
    }

    async fn fetch_page(&self, client: &Client, url: &str) -> Result<String> {
        debug!("HTTP GET {}", url);
        let response = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request failed: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP error {status}: {url}"));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body: {url}"))?;
        if body.is_empty() {
            return Err(anyhow!("empty response from {url}"));
        }
        Ok(body)
    }
}

#[async_trait]
impl QueryFetcher for SearchSession {
    async fn fetch_query(&self, url: &str) -> Result<StitchedPages> {
        let client = self.session_client()?;

        let mut html = self.fetch_page(&client, url).await?;
        let total_records = find_total_records(&html);

        let truncated = pagination::is_truncated(total_records);
        if truncated {
            warn!(
                "Max record count ({}) hit for {} - results are truncated",
                site::TRUNCATION_CEILING,
                url
            );
        }

        // Follow-up pages are numbered from 2 and must be fetched in order
        // on the same session.
        for page in 0..pagination::additional_pages(total_records) {
            let page_url = page_switch_url(page + 2);
            let body = self.fetch_page(&client, page_url.as_str()).await?;
            html.push_str(&body);
        }

        Ok(StitchedPages {
            html,
            total_records,
            truncated,
        })
    }
}

/// Pull the reported match total out of the first page's inline script.
/// A page without the marker reports zero records.
pub fn find_total_records(html: &str) -> u32 {
    TOTAL_RECORDS_RE
        .captures(html)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

// Endpoint constants are validated by tests; parsing them cannot fail at
// runtime.
fn action_url(endpoint: &str, params: &[(&str, &str)]) -> Url {
    let mut url = Url::parse(endpoint).expect("endpoint constant must be a valid URL");
    url.query_pairs_mut().extend_pairs(params);
    url
}

/// Search URL for a keyword query.
pub fn search_url(keyword: &str) -> Url {
    action_url(site::SEARCH_URL, &[("keywords", keyword)])
}

fn page_switch_url(page_number: u32) -> Url {
    action_url(site::PAGE_SWITCH_URL, &[("pageNum", &page_number.to_string())])
}

/// Detail URL for a class number / term code pair.
pub fn detail_url(class_number: &str, term_code: &str) -> Url {
    action_url(
        site::DETAIL_URL,
        &[("classNumber", class_number), ("termCode", term_code)],
    )
}
