//! Shared types for fsearch
//!
//! This crate contains the record, query vocabulary and result types shared
//! between the indexing daemon, the HTTP layer and the command line client.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Indexed file record
///
/// `basename`, `dirpath` and `extension` are always derived from `path`, so a
/// record can only be built through [`FileRecord::new`] or deserialization of a
/// previously derived record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub basename: String,
    pub dirpath: String,
    pub extension: String,
    pub size: u64,
    pub mtime: i64,
}

impl FileRecord {
    /// Build a record from an absolute path, deriving name, parent and extension.
    ///
    /// `path` is `dirpath/basename`, except for files directly under `/`
    /// whose `dirpath` is `/` itself and whose path is `/basename`.
    pub fn new(path: impl Into<String>, size: u64, mtime: i64) -> Self {
        let path = path.into();
        let path_obj = Path::new(&path);
        let basename = path_obj
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dirpath = path_obj
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = extension_of(&basename);

        Self {
            path,
            basename,
            dirpath,
            extension,
            size,
            mtime,
        }
    }
}

/// Lower-cased suffix after the last `.` of a file name.
///
/// Names without a dot, names ending in a dot and dotfiles such as `.bashrc`
/// have no extension.
pub fn extension_of(basename: &str) -> String {
    match basename.rfind('.') {
        None | Some(0) => String::new(),
        Some(idx) => basename[idx + 1..].to_lowercase(),
    }
}

/// Error returned when a textual enum value is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Text matching mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Case-insensitive containment against the full path
    #[default]
    Substring,
    /// Case-sensitive regular expression search
    Regex,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Substring => "substring",
            SearchMode::Regex => "regex",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" | "substr" => Ok(SearchMode::Substring),
            "regex" => Ok(SearchMode::Regex),
            _ => Err(UnknownVariant {
                kind: "search mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Field results are ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Path,
    Name,
    Size,
    Mtime,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Path => "path",
            SortField::Name => "name",
            SortField::Size => "size",
            SortField::Mtime => "mtime",
        }
    }
}

impl FromStr for SortField {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(SortField::Path),
            "name" | "basename" => Ok(SortField::Name),
            "size" => Ok(SortField::Size),
            "mtime" => Ok(SortField::Mtime),
            _ => Err(UnknownVariant {
                kind: "sort field",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(UnknownVariant {
                kind: "sort direction",
                value: s.to_string(),
            }),
        }
    }
}

/// Parse a `<field>_<direction>` sort key such as `mtime_desc`.
///
/// A bare field name sorts ascending.
pub fn parse_sort(s: &str) -> Result<(SortField, SortDirection), UnknownVariant> {
    if let Ok(field) = s.parse::<SortField>() {
        return Ok((field, SortDirection::Asc));
    }
    match s.rsplit_once('_') {
        Some((field, direction)) => Ok((field.parse()?, direction.parse()?)),
        None => Err(UnknownVariant {
            kind: "sort order",
            value: s.to_string(),
        }),
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub items: Vec<FileRecord>,
    /// Number of records matching before pagination
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub took_ms: u64,
}

/// Index statistics derived from the published snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_files: u64,
    pub total_size: u64,
    /// Completion time of the scan that produced the snapshot (epoch seconds)
    pub last_scan: Option<i64>,
}

/// Files and bytes indexed below one scan root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootStats {
    pub name: String,
    pub files: u64,
    pub size: u64,
}

/// An entry the crawler could not index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

/// Outcome of one completed scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub roots: Vec<String>,
    /// Regular files recorded
    pub files: u64,
    /// Entries that could not be read or were too recently modified
    pub skipped: u64,
    /// Entries left out by policy (exclusions, symlinks, special files)
    pub excluded: u64,
    /// First skipped entries with their reason
    pub skipped_entries: Vec<SkippedEntry>,
    pub started_at: i64,
    pub completed_at: i64,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_derives_name_parent_and_extension() {
        let record = FileRecord::new("/data/docs/Report.Final.PDF", 10, 1_700_000_000);
        assert_eq!(record.basename, "Report.Final.PDF");
        assert_eq!(record.dirpath, "/data/docs");
        assert_eq!(record.extension, "pdf");
        assert_eq!(
            format!("{}/{}", record.dirpath, record.basename),
            record.path
        );
    }

    #[test]
    fn file_under_filesystem_root() {
        let record = FileRecord::new("/x.txt", 1, 0);
        assert_eq!(record.dirpath, "/");
        assert_eq!(record.basename, "x.txt");
        assert_eq!(
            Path::new(&record.dirpath).join(&record.basename),
            Path::new(&record.path)
        );
        assert_ne!(format!("{}/{}", record.dirpath, record.basename), record.path);
    }

    #[test]
    fn extension_edge_cases() {
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("trailing."), "");
        assert_eq!(extension_of("archive.tar.GZ"), "gz");
        assert_eq!(extension_of(".config.toml"), "toml");
    }

    #[test]
    fn sort_keys() {
        assert_eq!(
            parse_sort("mtime_desc").unwrap(),
            (SortField::Mtime, SortDirection::Desc)
        );
        assert_eq!(
            parse_sort("name").unwrap(),
            (SortField::Name, SortDirection::Asc)
        );
        assert_eq!(
            parse_sort("path_asc").unwrap(),
            (SortField::Path, SortDirection::Asc)
        );
        assert!(parse_sort("owner_desc").is_err());
        assert!(parse_sort("size_sideways").is_err());
    }

    #[test]
    fn search_mode_accepts_alias() {
        assert_eq!("substr".parse::<SearchMode>().unwrap(), SearchMode::Substring);
        assert_eq!("REGEX".parse::<SearchMode>().unwrap(), SearchMode::Regex);
        assert!("plain".parse::<SearchMode>().is_err());
    }

    #[test]
    fn stats_serialize_missing_scan_as_null() {
        let json = serde_json::to_value(IndexStats::default()).unwrap();
        assert_eq!(json["total_files"], 0);
        assert!(json["last_scan"].is_null());
    }
}
