//! Parser for search-result pages: course listing identities.
//!
//! Each result row carries a `td` whose id starts with `classNumber_` and
//! whose `onclick` handler embeds the class number and term code. Rows
//! missing either value are skipped; a page with zero rows is a valid
//! empty result, not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::{ContextualParser, ParsingError, ParsingResult};
use crate::domain::CourseListing;

static CLASS_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"classNumber\s*:\s*'([^']+)'").unwrap());
static TERM_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"termCode\s*:\s*'([^']+)'").unwrap());

/// Context for one parsed search query.
#[derive(Debug, Clone)]
pub struct ListingContext {
    pub keyword: String,
    pub scraped_at: String,
    pub retry_attempt: u32,
}

pub struct ListingParser {
    cell_selector: Selector,
}

impl ListingParser {
    pub fn new() -> ParsingResult<Self> {
        let cell_selector = Selector::parse(r#"td[id^="classNumber_"]"#).map_err(|_| {
            ParsingError::InvalidSelector {
                selector: r#"td[id^="classNumber_"]"#.to_string(),
            }
        })?;
        Ok(Self { cell_selector })
    }
}

impl ContextualParser for ListingParser {
    type Output = Vec<CourseListing>;
    type Context = ListingContext;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &Self::Context,
    ) -> ParsingResult<Self::Output> {
        let mut listings = Vec::new();

        for cell in html.select(&self.cell_selector) {
            let Some(onclick) = cell.value().attr("onclick") else {
                continue;
            };

            let class_number = CLASS_NUMBER_RE
                .captures(onclick)
                .map(|caps| caps[1].to_string());
            let term_code = TERM_CODE_RE
                .captures(onclick)
                .map(|caps| caps[1].to_string());

            if let (Some(class_number), Some(term_code)) = (class_number, term_code) {
                listings.push(CourseListing {
                    class_number,
                    term_code,
                    keyword: context.keyword.clone(),
                    scraped_at: context.scraped_at.clone(),
                    retry_attempt: context.retry_attempt,
                });
            }
        }

        Ok(listings)
    }
}
