//! Query evaluation against a published snapshot
//!
//! A [`SearchQuery`] is validated once at the boundary (HTTP or CLI) and then
//! evaluated without locks against whatever snapshot the caller holds.

mod engine;
mod matcher;
mod params;
mod query;

pub use engine::evaluate;
pub use matcher::TextMatcher;
pub use params::RawSearchParams;
pub use query::SearchQuery;

use thiserror::Error;

/// Query validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid regex {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("page must be at least 1")]
    InvalidPage,

    #[error("per_page must be between 1 and {max}, got {per_page}")]
    InvalidPerPage { per_page: usize, max: usize },

    #[error("size_min ({min}) is greater than size_max ({max})")]
    InvertedSizeRange { min: u64, max: u64 },

    #[error("mtime_from ({from}) is later than mtime_to ({to})")]
    InvertedMtimeRange { from: i64, to: i64 },

    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}
