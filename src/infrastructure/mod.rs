//! Infrastructure: configuration, logging, HTTP fetching, HTML parsing.

pub mod config;
pub mod http_client;
pub mod logging;
pub mod parsing;

pub use config::{HarvestConfig, LoggingConfig};
pub use http_client::{QueryFetcher, SearchSession, StitchedPages};
