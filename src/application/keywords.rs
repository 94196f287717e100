//! Work-set enumeration for the listing-discovery pass.
//!
//! Every 3-digit course-code prefix from 000 to 998 becomes one keyword
//! query. Prefixes in the edge set report more matches than the platform's
//! truncation ceiling, so each is partitioned into ten sub-queries by a
//! leading digit. The 999-series is excluded by policy: it is dominated by
//! dissertation-research placeholder sections.

use crate::domain::constants::keywords::PREFIX_LIMIT;

/// Full keyword work set for a discovery pass.
pub fn keyword_queries(edge_prefixes: &[u32]) -> Vec<String> {
    let mut queries = Vec::new();

    for prefix in 0..PREFIX_LIMIT {
        if edge_prefixes.contains(&prefix) {
            for digit in 0..10 {
                queries.push(format!("{digit}{prefix:03}"));
            }
        } else {
            queries.push(format!("{prefix:03}"));
        }
    }

    queries
}
