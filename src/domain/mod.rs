//! Domain types and rules for the class-search catalog.

pub mod constants;
pub mod course_detail;
pub mod listing;
pub mod pagination;

pub use course_detail::CourseDetail;
pub use listing::CourseListing;
