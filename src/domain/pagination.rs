//! Result-count pagination rules for stitched queries.
//!
//! The search platform returns 50 records per page and reports the total
//! match count in an inline script on the first page. The number of
//! follow-up pages is derived from that count; an exact multiple of the
//! page size needs one fewer follow-up than ceiling division would give.

use super::constants::site;

/// Number of pages that must be fetched *after* the first one.
///
/// 0-50 records fit on the first page, 51-100 need one follow-up, and so
/// on. `total_records == 0` would compute to -1 and is clamped to zero.
pub fn additional_pages(total_records: u32) -> u32 {
    let full_pages = i64::from(total_records / site::PAGE_SIZE);
    let exact_multiple = i64::from(total_records % site::PAGE_SIZE == 0);
    (full_pages - exact_multiple).max(0) as u32
}

/// Whether a reported total sits at the platform's silent cap, meaning the
/// true count is unknown and the result set is incomplete.
pub fn is_truncated(total_records: u32) -> bool {
    total_records == site::TRUNCATION_CEILING
}
