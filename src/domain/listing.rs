//! Course listing records discovered by the keyword pass.

use serde::{Deserialize, Serialize};

/// One discovered class listing. Identity is `(classNumber, termCode)`;
/// the listing store keeps the first record seen for an identity and
/// silently drops later duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseListing {
    #[serde(rename = "classNumber")]
    pub class_number: String,
    #[serde(rename = "termCode")]
    pub term_code: String,
    /// The search keyword that surfaced this listing.
    pub keyword: String,
    /// RFC3339 timestamp of the harvesting run that produced the record.
    pub scraped_at: String,
    /// 0 for the initial pass, 1 when the record came from the retry pass.
    pub retry_attempt: u32,
}

impl CourseListing {
    /// Stable string form of the identity, used by the listing store map.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.class_number, self.term_code)
    }
}
