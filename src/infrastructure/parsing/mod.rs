//! HTML parsing infrastructure for the class-search page layouts.
//!
//! Trait-based parsers with pre-compiled CSS selectors and structured
//! error reporting. A parser failure is always scoped to one work unit;
//! the engine logs it and queues the unit for the retry pass.

pub mod detail_parser;
pub mod error;
pub mod listing_parser;

pub use detail_parser::DetailParser;
pub use error::{ParsingError, ParsingResult};
pub use listing_parser::ListingParser;

use scraper::Html;

/// Parser with contextual information about the originating query.
pub trait ContextualParser {
    type Output;
    type Context;

    fn parse_with_context(&self, html: &Html, context: &Self::Context)
        -> ParsingResult<Self::Output>;
}
