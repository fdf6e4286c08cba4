//! Filtering, ordering and pagination over a snapshot

use std::cmp::Ordering;
use std::path::Path;
use std::time::Instant;

use fsearch_core::{FileRecord, SearchResult, SortDirection, SortField};
use tracing::debug;

use super::matcher::TextMatcher;
use super::{QueryError, SearchQuery};
use crate::index::IndexSnapshot;

/// Evaluate `query` against `snapshot`.
///
/// All predicates are AND-combined. Results are ordered by the requested
/// field with ties broken by ascending path, then cut to the requested page.
/// A page past the end yields no items but still reports the full total.
pub fn evaluate(snapshot: &IndexSnapshot, query: &SearchQuery) -> Result<SearchResult, QueryError> {
    let started = Instant::now();
    query.validate()?;

    let matcher = TextMatcher::compile(query.text.as_deref(), query.mode)?;
    let dir = query.dir_filter.as_deref().and_then(normalize_dir);
    let extensions = query.ext_filter();

    let mut matching: Vec<&FileRecord> = snapshot
        .records()
        .iter()
        .filter(|r| dir.is_none_or(|d| in_directory(&r.dirpath, d)))
        .filter(|r| extensions.is_empty() || extensions.contains(&r.extension))
        .filter(|r| query.size_min.is_none_or(|min| r.size >= min))
        .filter(|r| query.size_max.is_none_or(|max| r.size <= max))
        .filter(|r| query.mtime_from.is_none_or(|from| r.mtime >= from))
        .filter(|r| query.mtime_to.is_none_or(|to| r.mtime <= to))
        .filter(|r| matcher.matches(r))
        .collect();

    // Snapshot order is already path ascending
    if !(query.sort_field == SortField::Path && query.sort_direction == SortDirection::Asc) {
        matching.sort_by(|a, b| compare(a, b, query.sort_field, query.sort_direction));
    }

    let total = matching.len();
    let start = (query.page - 1).saturating_mul(query.per_page);
    let items: Vec<FileRecord> = matching
        .into_iter()
        .skip(start)
        .take(query.per_page)
        .cloned()
        .collect();
    let total_pages = total.div_ceil(query.per_page).max(1);
    let took_ms = started.elapsed().as_millis() as u64;

    debug!(
        "Evaluated query over {} records: {} matches in {}ms",
        snapshot.total_files(),
        total,
        took_ms
    );

    Ok(SearchResult {
        items,
        total,
        page: query.page,
        per_page: query.per_page,
        total_pages,
        took_ms,
    })
}

fn compare(a: &FileRecord, b: &FileRecord, field: SortField, direction: SortDirection) -> Ordering {
    let ordering = match field {
        SortField::Path => a.path.cmp(&b.path),
        SortField::Name => a.basename.cmp(&b.basename),
        SortField::Size => a.size.cmp(&b.size),
        SortField::Mtime => a.mtime.cmp(&b.mtime),
    };
    let ordering = match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };
    ordering.then_with(|| a.path.cmp(&b.path))
}

/// Strip trailing separators; a filter of only separators means the root
fn normalize_dir(dir: &str) -> Option<&str> {
    if dir.is_empty() {
        return None;
    }
    let trimmed = dir.trim_end_matches('/');
    Some(if trimmed.is_empty() { "/" } else { trimmed })
}

/// True when `dirpath` is `dir` or lies under it, compared by component
fn in_directory(dirpath: &str, dir: &str) -> bool {
    Path::new(dirpath).starts_with(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsearch_core::SearchMode;

    fn snapshot(records: Vec<FileRecord>) -> IndexSnapshot {
        IndexSnapshot::new(records, 0, 1)
    }

    fn paths(result: &SearchResult) -> Vec<&str> {
        result.items.iter().map(|r| r.path.as_str()).collect()
    }

    fn sample() -> IndexSnapshot {
        snapshot(vec![
            FileRecord::new("/a/doc.txt", 100, 1_000),
            FileRecord::new("/a/DOCX/readme", 2_000, 3_000),
            FileRecord::new("/a/report.pdf", 50_000, 2_000),
            FileRecord::new("/foo/x.PDF", 10, 5_000),
            FileRecord::new("/foobar/y.txt", 10, 4_000),
            FileRecord::new("/foo/sub/z.md", 700, 4_000),
        ])
    }

    #[test]
    fn empty_index_yields_empty_result() {
        let result = evaluate(&IndexSnapshot::empty(), &SearchQuery::new("anything")).unwrap();
        assert_eq!(result.total, 0);
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 1);
    }

    #[test]
    fn substring_search() {
        let result = evaluate(&sample(), &SearchQuery::new("doc")).unwrap();
        assert_eq!(paths(&result), vec!["/a/DOCX/readme", "/a/doc.txt"]);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn regex_search_and_errors() {
        let query = SearchQuery::new(r"\.(pdf|PDF)$").with_mode(SearchMode::Regex);
        let result = evaluate(&sample(), &query).unwrap();
        assert_eq!(paths(&result), vec!["/a/report.pdf", "/foo/x.PDF"]);

        let bad = SearchQuery::new("[").with_mode(SearchMode::Regex);
        assert!(matches!(
            evaluate(&sample(), &bad),
            Err(QueryError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn directory_filter_respects_segments() {
        let result = evaluate(&sample(), &SearchQuery::default().with_directory("/foo")).unwrap();
        assert_eq!(paths(&result), vec!["/foo/sub/z.md", "/foo/x.PDF"]);

        let trailing = evaluate(&sample(), &SearchQuery::default().with_directory("/foo/")).unwrap();
        assert_eq!(trailing.total, 2);

        let root = evaluate(&sample(), &SearchQuery::default().with_directory("/")).unwrap();
        assert_eq!(root.total, 6);
    }

    #[test]
    fn directory_and_text_filters_combine() {
        let query = SearchQuery::new("x").with_directory("/foo");
        let result = evaluate(&sample(), &query).unwrap();
        assert_eq!(paths(&result), vec!["/foo/x.PDF"]);
    }

    #[test]
    fn extension_filter_is_an_or() {
        let query = SearchQuery::default()
            .with_extension(".pdf")
            .with_extension("MD");
        let result = evaluate(&sample(), &query).unwrap();
        assert_eq!(paths(&result), vec!["/a/report.pdf", "/foo/sub/z.md", "/foo/x.PDF"]);
    }

    #[test]
    fn extension_filter_ignores_case_and_dot() {
        for ext in ["PDF", ".Pdf", " pdf "] {
            let query = SearchQuery::default().with_extension(ext);
            let result = evaluate(&sample(), &query).unwrap();
            assert_eq!(paths(&result), vec!["/a/report.pdf", "/foo/x.PDF"], "{ext:?}");
        }
    }

    #[test]
    fn size_and_mtime_ranges_are_inclusive() {
        let sized = SearchQuery::default().with_size_range(Some(100), Some(2_000));
        let result = evaluate(&sample(), &sized).unwrap();
        assert_eq!(paths(&result), vec!["/a/DOCX/readme", "/a/doc.txt", "/foo/sub/z.md"]);

        let dated = SearchQuery::default().with_mtime_range(Some(4_000), None);
        let result = evaluate(&sample(), &dated).unwrap();
        assert_eq!(paths(&result), vec!["/foo/sub/z.md", "/foo/x.PDF", "/foobar/y.txt"]);

        let inverted = SearchQuery::default().with_size_range(Some(10), Some(1));
        assert!(matches!(
            evaluate(&sample(), &inverted),
            Err(QueryError::InvertedSizeRange { .. })
        ));
    }

    #[test]
    fn sort_ties_break_by_path() {
        let query = SearchQuery::default().with_sort(SortField::Mtime, SortDirection::Desc);
        let result = evaluate(&sample(), &query).unwrap();
        assert_eq!(
            paths(&result),
            vec![
                "/foo/x.PDF",
                "/foo/sub/z.md",
                "/foobar/y.txt",
                "/a/DOCX/readme",
                "/a/report.pdf",
                "/a/doc.txt",
            ]
        );

        let by_size = SearchQuery::default().with_sort(SortField::Size, SortDirection::Asc);
        let result = evaluate(&sample(), &by_size).unwrap();
        assert_eq!(&paths(&result)[..2], &["/foo/x.PDF", "/foobar/y.txt"]);
    }

    #[test]
    fn name_sort_uses_basename() {
        let query = SearchQuery::default().with_sort(SortField::Name, SortDirection::Asc);
        let result = evaluate(&sample(), &query).unwrap();
        let names: Vec<&str> = result.items.iter().map(|r| r.basename.as_str()).collect();
        assert_eq!(
            names,
            vec!["doc.txt", "readme", "report.pdf", "x.PDF", "y.txt", "z.md"]
        );
    }

    #[test]
    fn pages_partition_the_matching_set() {
        let records = (0..25)
            .map(|i| FileRecord::new(format!("/p/file{i:02}.dat"), i, 0))
            .collect();
        let snapshot = snapshot(records);

        let mut seen = Vec::new();
        for page in 1..=3 {
            let result = evaluate(&snapshot, &SearchQuery::default().with_page(page, 10)).unwrap();
            assert_eq!(result.total, 25);
            assert_eq!(result.total_pages, 3);
            seen.extend(result.items.into_iter().map(|r| r.path));
        }
        assert_eq!(seen.len(), 25);
        let mut unique = seen.clone();
        unique.dedup();
        assert_eq!(unique, seen);

        let past_end = evaluate(&snapshot, &SearchQuery::default().with_page(4, 10)).unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 25);
    }

    #[test]
    fn invalid_paging_is_rejected() {
        assert_eq!(
            evaluate(&sample(), &SearchQuery::default().with_page(0, 10)).unwrap_err(),
            QueryError::InvalidPage
        );
    }
}
