//! Full course-section records harvested from class-detail pages.

use serde::{Deserialize, Serialize};

/// Detailed information for a single class section.
///
/// Field names mirror the persisted snapshot schema consumed by the
/// downstream indexing step; enrollment counts stay as the page's text
/// (the indexer coerces numerics itself). Identity is the composite
/// `id` derived from class number and term code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseDetail {
    /// `"cn{classNumber}tc{termCode}"`.
    pub id: String,
    pub course_dept: String,
    pub course_code: String,
    pub class_section: String,
    pub course_title: String,
    pub school: String,
    pub career: String,
    pub class_type: String,
    pub credit_hours: String,
    pub grading_basis: String,
    pub consent: String,
    pub term_year: String,
    pub term_season: String,
    pub session: String,
    pub dates: String,
    pub requirements: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub capacity: String,
    pub enrolled: String,
    pub wl_capacity: String,
    pub wl_occupied: String,
    pub attributes: Option<Vec<String>>,
    /// Parallel sequences: entry i of days/times/dates describes the same
    /// meeting pattern row.
    pub meeting_days: Vec<String>,
    pub meeting_times: Vec<String>,
    pub meeting_dates: Vec<String>,
    /// Primary instructors first, then alphabetical; non-primary names are
    /// suffixed with " (Secondary)".
    pub instructors: Vec<String>,
}

/// Composite detail identity for a class number / term code pair.
pub fn detail_id(class_number: &str, term_code: &str) -> String {
    format!("cn{class_number}tc{term_code}")
}
