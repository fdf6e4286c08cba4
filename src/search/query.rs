//! Typed search request

use std::collections::BTreeSet;

use fsearch_core::{SearchMode, SortDirection, SortField};

use super::QueryError;

/// A validated-on-evaluation search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Text to match; `None` matches everything
    pub text: Option<String>,
    pub mode: SearchMode,
    /// Only records at or below this directory
    pub dir_filter: Option<String>,
    /// Normalized extensions (lower case, no leading dot); empty = any.
    /// Only filled through `with_extension` so it is always normalized.
    ext_filter: BTreeSet<String>,
    pub size_min: Option<u64>,
    pub size_max: Option<u64>,
    pub mtime_from: Option<i64>,
    pub mtime_to: Option<i64>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub page: usize,
    pub per_page: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            mode: SearchMode::Substring,
            dir_filter: None,
            ext_filter: BTreeSet::new(),
            size_min: None,
            size_max: None,
            mtime_from: None,
            mtime_to: None,
            sort_field: SortField::Path,
            sort_direction: SortDirection::Asc,
            page: 1,
            per_page: 50,
        }
    }
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self::default().with_text(text)
    }

    /// Set the text; blank text clears it
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.is_empty() { None } else { Some(text) };
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_directory(mut self, dir: impl Into<String>) -> Self {
        self.dir_filter = Some(dir.into());
        self
    }

    /// Add an extension to the filter; `.PDF`, `pdf` and ` Pdf ` are the same
    pub fn with_extension(mut self, ext: &str) -> Self {
        let ext = normalize_extension(ext);
        if !ext.is_empty() {
            self.ext_filter.insert(ext);
        }
        self
    }

    pub fn ext_filter(&self) -> &BTreeSet<String> {
        &self.ext_filter
    }

    pub fn with_size_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.size_min = min;
        self.size_max = max;
        self
    }

    pub fn with_mtime_range(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.mtime_from = from;
        self.mtime_to = to;
        self
    }

    pub fn with_sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }

    pub fn with_page(mut self, page: usize, per_page: usize) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Check paging and range bounds
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.page < 1 {
            return Err(QueryError::InvalidPage);
        }
        if self.per_page < 1 {
            return Err(QueryError::InvalidPerPage {
                per_page: self.per_page,
                max: usize::MAX,
            });
        }
        if let (Some(min), Some(max)) = (self.size_min, self.size_max) {
            if min > max {
                return Err(QueryError::InvertedSizeRange { min, max });
            }
        }
        if let (Some(from), Some(to)) = (self.mtime_from, self.mtime_to) {
            if from > to {
                return Err(QueryError::InvertedMtimeRange { from, to });
            }
        }
        Ok(())
    }
}

pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_normalized() {
        let query = SearchQuery::default()
            .with_extension(".PDF")
            .with_extension(" txt ")
            .with_extension("pdf")
            .with_extension(".");
        let exts: Vec<&str> = query.ext_filter.iter().map(String::as_str).collect();
        assert_eq!(exts, vec!["pdf", "txt"]);
    }

    #[test]
    fn empty_text_is_absent() {
        assert_eq!(SearchQuery::new("").text, None);
        assert_eq!(SearchQuery::new("doc").text.as_deref(), Some("doc"));
    }

    #[test]
    fn validation_rejects_bad_bounds() {
        assert_eq!(
            SearchQuery::default().with_page(0, 10).validate(),
            Err(QueryError::InvalidPage)
        );
        assert!(matches!(
            SearchQuery::default().with_page(1, 0).validate(),
            Err(QueryError::InvalidPerPage { per_page: 0, .. })
        ));
        assert_eq!(
            SearchQuery::default()
                .with_size_range(Some(10), Some(5))
                .validate(),
            Err(QueryError::InvertedSizeRange { min: 10, max: 5 })
        );
        assert_eq!(
            SearchQuery::default()
                .with_mtime_range(Some(200), Some(100))
                .validate(),
            Err(QueryError::InvertedMtimeRange { from: 200, to: 100 })
        );
        assert!(
            SearchQuery::default()
                .with_size_range(Some(5), Some(5))
                .validate()
                .is_ok()
        );
    }
}
