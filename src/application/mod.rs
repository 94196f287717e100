//! Harvest orchestration: the generic engine, batched persistence, and the
//! two concrete passes.

pub mod engine;
pub mod keywords;
pub mod passes;
pub mod persister;

pub use engine::{HarvestEngine, HarvestSummary, WorkItem, WorkProcessor};
pub use passes::{run_detail_pass, run_listing_pass};
pub use persister::{BatchPersister, DetailMerge, ListingMerge, MergePolicy};
