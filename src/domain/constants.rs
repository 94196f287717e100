//! Site characteristics and harvesting defaults.
//!
//! Everything here is an empirical property of the class-search platform or
//! a default knob; the edge-prefix list in particular tracks the catalog's
//! data distribution and is overridable through configuration.

/// Class-search platform characteristics.
pub mod site {
    /// Search endpoint; takes a `keywords` parameter.
    pub const SEARCH_URL: &str =
        "https://more.app.vanderbilt.edu/more/SearchClassesExecute!search.action";

    /// Page-switch endpoint, stateful relative to the session that issued
    /// the initial search. Its `pageNum` parameter starts at 2 for the
    /// first follow-up page.
    pub const PAGE_SWITCH_URL: &str =
        "https://more.app.vanderbilt.edu/more/SearchClassesExecute!switchPage.action";

    /// Class-detail endpoint; takes `classNumber` and `termCode` parameters.
    pub const DETAIL_URL: &str =
        "https://more.app.vanderbilt.edu/more/GetClassSectionDetail.action";

    /// Records per result page.
    pub const PAGE_SIZE: u32 = 50;

    /// The platform silently caps any single query at this many records.
    /// A query reporting exactly this count has an unknown true total.
    pub const TRUNCATION_CEILING: u32 = 300;
}

/// Keyword enumeration policy for the listing-discovery pass.
pub mod keywords {
    /// Course-code prefixes enumerated as `000..=998`; the 999-series is
    /// excluded (dominated by dissertation-research placeholder sections).
    pub const PREFIX_LIMIT: u32 = 999;

    /// Prefixes whose result sets exceed the truncation ceiling; each is
    /// partitioned into ten sub-queries by a leading digit.
    pub const EDGE_PREFIXES: &[u32] = &[100, 110, 385, 799, 850, 899];
}

/// Default harvesting knobs.
pub mod harvest {
    pub const DEFAULT_MAX_CONCURRENT: usize = 10;

    pub const DEFAULT_BATCH_SIZE: usize = 500;

    pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const DEFAULT_USER_AGENT: &str =
        "course-harvester/0.3 (catalog research tool)";

    pub const DEFAULT_DATA_DIR: &str = "data";

    pub const LISTINGS_FILE: &str = "course_listings.json";

    pub const DETAILS_FILE: &str = "data.json";
}
