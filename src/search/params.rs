//! Untyped request parameters and their validation into a [`SearchQuery`]
//!
//! Both the HTTP handler and the CLI feed strings through here so the two
//! front ends accept exactly the same inputs.

use std::str::FromStr;

use fsearch_core::{SearchMode, parse_sort};

use super::query::normalize_extension;
use super::{QueryError, SearchQuery};
use crate::config::SearchConfig;

/// Sort applied when the caller does not name one
pub const DEFAULT_SORT: &str = "mtime_desc";

/// Raw search parameters as they arrive from a query string or command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSearchParams {
    pub q: Option<String>,
    pub mode: Option<String>,
    pub dir: Option<String>,
    /// Each value may hold several comma-separated extensions
    pub ext: Vec<String>,
    pub size_min: Option<String>,
    pub size_max: Option<String>,
    pub mtime_from: Option<String>,
    pub mtime_to: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl RawSearchParams {
    /// Collect parameters from decoded query-string pairs.
    ///
    /// `ext` may repeat; for every other key the last value wins. Unknown keys
    /// are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.clone();
            match key.as_str() {
                "q" => params.q = Some(value),
                "mode" => params.mode = Some(value),
                "dir" => params.dir = Some(value),
                "ext" => params.ext.push(value),
                "size_min" => params.size_min = Some(value),
                "size_max" => params.size_max = Some(value),
                "mtime_from" => params.mtime_from = Some(value),
                "mtime_to" => params.mtime_to = Some(value),
                "sort" => params.sort = Some(value),
                "page" => params.page = Some(value),
                "per_page" => params.per_page = Some(value),
                _ => {}
            }
        }
        params
    }

    /// Validate every parameter and build the typed query.
    pub fn into_query(self, limits: &SearchConfig) -> Result<SearchQuery, QueryError> {
        let mode = match present(self.mode) {
            Some(mode) => SearchMode::from_str(&mode).map_err(|e| invalid("mode", &mode, e))?,
            None => SearchMode::default(),
        };

        let sort = present(self.sort).unwrap_or_else(|| DEFAULT_SORT.to_string());
        let (sort_field, sort_direction) = parse_sort(&sort).map_err(|e| invalid("sort", &sort, e))?;

        let page = parse_number::<usize>("page", self.page)?.unwrap_or(1);
        if page < 1 {
            return Err(QueryError::InvalidPage);
        }
        let per_page =
            parse_number::<usize>("per_page", self.per_page)?.unwrap_or(limits.default_per_page);
        if per_page < 1 || per_page > limits.max_per_page {
            return Err(QueryError::InvalidPerPage {
                per_page,
                max: limits.max_per_page,
            });
        }

        let mut query = SearchQuery::default()
            .with_mode(mode)
            .with_sort(sort_field, sort_direction)
            .with_page(page, per_page)
            .with_size_range(
                parse_number("size_min", self.size_min)?,
                parse_number("size_max", self.size_max)?,
            )
            .with_mtime_range(
                parse_number("mtime_from", self.mtime_from)?,
                parse_number("mtime_to", self.mtime_to)?,
            );

        if let Some(text) = present(self.q) {
            query = query.with_text(text);
        }
        if let Some(dir) = present(self.dir) {
            query = query.with_directory(dir);
        }
        for ext in self.ext.iter().flat_map(|v| v.split(',')) {
            if !normalize_extension(ext).is_empty() {
                query = query.with_extension(ext);
            }
        }

        query.validate()?;
        Ok(query)
    }
}

/// Empty values count as absent
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number<T>(name: &'static str, value: Option<String>) -> Result<Option<T>, QueryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match present(value) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(name, &raw, e)),
        None => Ok(None),
    }
}

fn invalid(name: &'static str, value: &str, reason: impl std::fmt::Display) -> QueryError {
    QueryError::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
