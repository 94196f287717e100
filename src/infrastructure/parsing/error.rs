//! Parsing error types for the class-search page layouts.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("required element '{field}' not found in page{}", context_suffix(.context))]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },

    #[error("malformed {section}: {reason}")]
    MalformedSection { section: String, reason: String },
}

fn context_suffix(context: &Option<String>) -> String {
    context
        .as_ref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

impl ParsingError {
    pub fn required_field_missing(field: impl Into<String>, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.into(),
            context: context.map(str::to_string),
        }
    }

    pub fn malformed(section: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSection {
            section: section.into(),
            reason: reason.into(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
