//! Text predicates compiled once per evaluation

use fsearch_core::{FileRecord, SearchMode};
use regex::Regex;

use super::QueryError;

/// Compiled text predicate
#[derive(Debug)]
pub enum TextMatcher {
    Any,
    /// Case-insensitive containment in the full path
    Substring { needle: String, ascii: bool },
    /// Case-sensitive search in the basename or the full path
    Regex(Regex),
}

impl TextMatcher {
    pub fn compile(text: Option<&str>, mode: SearchMode) -> Result<Self, QueryError> {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return Ok(TextMatcher::Any);
        };

        match mode {
            SearchMode::Substring => Ok(TextMatcher::Substring {
                needle: text.to_lowercase(),
                ascii: text.is_ascii(),
            }),
            SearchMode::Regex => Regex::new(text)
                .map(TextMatcher::Regex)
                .map_err(|e| QueryError::InvalidRegex {
                    pattern: text.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    pub fn matches(&self, record: &FileRecord) -> bool {
        match self {
            TextMatcher::Any => true,
            TextMatcher::Substring { needle, ascii } => {
                if *ascii {
                    contains_ignore_ascii_case(&record.path, needle)
                } else {
                    record.path.to_lowercase().contains(needle.as_str())
                }
            }
            // Anchored patterns like ^name\.ext$ are meant for the basename
            TextMatcher::Regex(re) => re.is_match(&record.basename) || re.is_match(&record.path),
        }
    }
}

/// Containment without allocating; `needle` must already be lower case.
fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}
