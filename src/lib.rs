//! Concurrent two-pass harvester for the university class-search catalog.
//!
//! Pass one discovers course listings by enumerating keyword queries; pass
//! two fetches a detail page per listing. Both passes run through the same
//! bounded-concurrency engine with a single retry pass over failures and
//! batched full-snapshot persistence.

pub mod application;
pub mod domain;
pub mod infrastructure;
