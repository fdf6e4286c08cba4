//! Response bodies of the HTTP API

use fsearch_core::{FileRecord, RootStats, ScanReport, SearchResult};
use serde::{Deserialize, Serialize};

use super::format::{format_size, format_timestamp};

/// One search hit with display fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    pub basename: String,
    pub ext: String,
    pub dirpath: String,
    pub size: u64,
    pub mtime: i64,
    pub size_formatted: String,
    pub mtime_formatted: String,
}

impl From<FileRecord> for SearchHit {
    fn from(record: FileRecord) -> Self {
        Self {
            size_formatted: format_size(record.size),
            mtime_formatted: format_timestamp(record.mtime),
            path: record.path,
            basename: record.basename,
            ext: record.extension,
            dirpath: record.dirpath,
            size: record.size,
            mtime: record.mtime,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: String,
    pub total: usize,
    pub took_ms: u64,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn new(query: String, mode: &str, result: SearchResult) -> Self {
        Self {
            query,
            mode: mode.to_string(),
            total: result.total,
            took_ms: result.took_ms,
            page: result.page,
            per_page: result.per_page,
            total_pages: result.total_pages,
            results: result.items.into_iter().map(SearchHit::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_files: u64,
    pub total_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<i64>,
    pub scanning: bool,
    /// Files recorded so far by the running scan
    pub files_seen: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_scan_path: Option<String>,
    pub last_report: Option<ScanReport>,
    pub roots: Vec<RootSummary>,
}

/// Per-root share of the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootSummary {
    pub name: String,
    pub files: u64,
    pub size: u64,
    pub size_formatted: String,
}

impl From<RootStats> for RootSummary {
    fn from(stats: RootStats) -> Self {
        Self {
            size_formatted: format_size(stats.size),
            name: stats.name,
            files: stats.files,
            size: stats.size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub indexed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionCount {
    pub ext: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub extensions: Vec<ExtensionCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexResponse {
    pub message: String,
}
