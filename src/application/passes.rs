//! The two concrete harvesting passes wired onto the generic engine.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use scraper::Html;
use tracing::{info, warn};

use super::engine::{HarvestEngine, HarvestSummary, WorkItem, WorkProcessor};
use super::keywords::keyword_queries;
use super::persister::{load_snapshot, BatchPersister, DetailMerge, ListingMerge};
use crate::domain::{CourseDetail, CourseListing};
use crate::infrastructure::config::HarvestConfig;
use crate::infrastructure::http_client::{detail_url, search_url, QueryFetcher, SearchSession};
use crate::infrastructure::parsing::detail_parser::DetailContext;
use crate::infrastructure::parsing::listing_parser::ListingContext;
use crate::infrastructure::parsing::{ContextualParser, DetailParser, ListingParser};

/// One keyword query in the discovery pass.
#[derive(Debug, Clone)]
pub struct KeywordQuery(pub String);

impl WorkItem for KeywordQuery {
    fn describe(&self) -> String {
        format!("keyword '{}'", self.0)
    }
}

impl WorkItem for CourseListing {
    fn describe(&self) -> String {
        format!("listing ({}, {})", self.class_number, self.term_code)
    }
}

/// Keyword query -> stitched search pages -> listing records.
pub struct ListingPass {
    fetcher: Arc<dyn QueryFetcher>,
    parser: ListingParser,
    scraped_at: String,
}

impl ListingPass {
    pub fn new(fetcher: Arc<dyn QueryFetcher>) -> Result<Self> {
        Ok(Self {
            fetcher,
            parser: ListingParser::new()?,
            scraped_at: Local::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl WorkProcessor for ListingPass {
    type Item = KeywordQuery;
    type Record = CourseListing;

    async fn process(&self, item: &KeywordQuery, retry_attempt: u32) -> Result<Vec<CourseListing>> {
        let stitched = self.fetcher.fetch_query(search_url(&item.0).as_str()).await?;

        let context = ListingContext {
            keyword: item.0.clone(),
            scraped_at: self.scraped_at.clone(),
            retry_attempt,
        };
        let html = Html::parse_document(&stitched.html);
        let listings = self.parser.parse_with_context(&html, &context)?;
        Ok(listings)
    }
}

/// Listing identity -> detail page -> one full course record.
pub struct DetailPass {
    fetcher: Arc<dyn QueryFetcher>,
    parser: DetailParser,
}

impl DetailPass {
    pub fn new(fetcher: Arc<dyn QueryFetcher>) -> Result<Self> {
        Ok(Self {
            fetcher,
            parser: DetailParser::new()?,
        })
    }
}

#[async_trait]
impl WorkProcessor for DetailPass {
    type Item = CourseListing;
    type Record = CourseDetail;

    async fn process(&self, item: &CourseListing, _retry_attempt: u32) -> Result<Vec<CourseDetail>> {
        let url = detail_url(&item.class_number, &item.term_code);
        let stitched = self.fetcher.fetch_query(url.as_str()).await?;

        let context = DetailContext {
            term_code: item.term_code.clone(),
        };
        let html = Html::parse_document(&stitched.html);
        let detail = self.parser.parse_with_context(&html, &context)?;
        Ok(vec![detail])
    }
}

/// Discover course listings for every keyword query.
pub async fn run_listing_pass(config: &HarvestConfig) -> Result<HarvestSummary> {
    let queries: Vec<KeywordQuery> = keyword_queries(&config.edge_prefixes)
        .into_iter()
        .map(KeywordQuery)
        .collect();
    info!(
        "Discovering course listings across {} keyword queries (concurrency {})",
        queries.len(),
        config.max_concurrent
    );

    let fetcher: Arc<dyn QueryFetcher> = Arc::new(SearchSession::from_config(config));
    let processor = Arc::new(ListingPass::new(fetcher)?);
    let engine = HarvestEngine::new(processor, config.max_concurrent);

    let mut persister =
        BatchPersister::<ListingMerge>::load(config.listings_path(), config.batch_size)?;
    let summary = engine.run(queries, &mut persister).await?;
    summary.log("Listing");
    Ok(summary)
}

/// Harvest a detail record for every stored listing.
pub async fn run_detail_pass(config: &HarvestConfig) -> Result<HarvestSummary> {
    let listings: Vec<CourseListing> = load_snapshot(&config.listings_path())?;
    if listings.is_empty() {
        warn!(
            "Listing store {} is empty - run the discovery pass first",
            config.listings_path().display()
        );
    }
    info!(
        "Harvesting details for {} listing(s) (concurrency {}, batch size {})",
        listings.len(),
        config.max_concurrent,
        config.batch_size
    );

    let fetcher: Arc<dyn QueryFetcher> = Arc::new(SearchSession::from_config(config));
    let processor = Arc::new(DetailPass::new(fetcher)?);
    let engine = HarvestEngine::new(processor, config.max_concurrent);

    let mut persister =
        BatchPersister::<DetailMerge>::load(config.details_path(), config.batch_size)?;
    let summary = engine.run(listings, &mut persister).await?;
    summary.log("Detail");
    Ok(summary)
}
