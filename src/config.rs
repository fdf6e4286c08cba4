//! Configuration management for fsearch
//!
//! Handles loading, saving, and environment overrides of the service
//! configuration.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Path to database file (not serialized)
    #[serde(skip)]
    pub db_path: PathBuf,
}

/// What the crawler walks and how
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Root directories scanned on every crawl
    #[serde(default = "default_roots")]
    pub roots: Vec<String>,

    /// Excluded path prefixes (absolute paths)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Pattern-based exclusions (glob patterns)
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// File with extra glob exclusions, one per line (`#` starts a comment)
    #[serde(default)]
    pub excludes_file: Option<String>,

    /// Include hidden files/directories
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Follow symbolic links instead of skipping them
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Skip files modified less than this many seconds before the scan (0 = off)
    #[serde(default)]
    pub stability_secs: u64,

    /// Rescan period in seconds (0 = only on startup and on request)
    #[serde(default = "default_rescan_interval")]
    pub rescan_interval_secs: u64,

    /// Run a scan as soon as the daemon starts
    #[serde(default = "default_true")]
    pub scan_on_startup: bool,
}

/// Query limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,

    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,

    /// Deadline for a single search in milliseconds (0 = none)
    #[serde(default)]
    pub timeout_ms: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Snapshot persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Write every completed snapshot to the database and reload it on start
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Custom database path (optional)
    #[serde(default)]
    pub db_path: Option<String>,
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions
fn default_roots() -> Vec<String> {
    vec!["/data".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_rescan_interval() -> u64 {
    3600
}

fn default_per_page() -> usize {
    50
}

fn default_max_per_page() -> usize {
    500
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/.git".to_string(),
        "**/node_modules".to_string(),
        "**/__pycache__".to_string(),
        "**/*.swp".to_string(),
        "**/*.tmp".to_string(),
    ]
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            exclude: Vec::new(),
            exclude_patterns: default_exclude_patterns(),
            excludes_file: None,
            include_hidden: true,
            follow_symlinks: false,
            stability_secs: 0,
            rescan_interval_secs: default_rescan_interval(),
            scan_on_startup: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            timeout_ms: 0,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist: true,
            db_path: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let (config_path, db_path) = Self::get_default_paths();
        Self {
            index: IndexConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            service: ServiceConfig::default(),
            config_path,
            db_path,
        }
    }
}

impl Config {
    /// Get default paths for config and database
    fn get_default_paths() -> (PathBuf, PathBuf) {
        if let Some(proj_dirs) = ProjectDirs::from("dev", "fsearch", "fsearch") {
            (
                proj_dirs.config_dir().join("config.toml"),
                proj_dirs.data_dir().join("fsearch.db"),
            )
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            (
                PathBuf::from(&home).join(".config/fsearch/config.toml"),
                PathBuf::from(&home).join(".local/share/fsearch/fsearch.db"),
            )
        }
    }

    /// Load configuration from file, or create default if not exists.
    ///
    /// `path` overrides the platform config location. Environment overrides
    /// are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (default_config_path, default_db_path) = Self::get_default_paths();
        let config_path = path.map(Path::to_path_buf).unwrap_or(default_config_path);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?
        } else {
            info!("Config file not found, creating default at {:?}", config_path);
            let config = Config {
                config_path: config_path.clone(),
                ..Config::default()
            };
            config.save()?;
            config
        };

        config.config_path = config_path;
        config.db_path = match &config.storage.db_path {
            Some(custom) => PathBuf::from(custom),
            None => default_db_path,
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.index.merge_excludes_file()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        let (config_path, db_path) = Self::get_default_paths();
        config.config_path = config_path;
        config.db_path = db_path;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // Ensure parent directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;

        info!("Configuration saved to {:?}", self.config_path);
        Ok(())
    }

    /// Apply the deployment environment variables on top of the file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(roots) = lookup("SCAN_ROOTS") {
            self.index.roots = roots
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(value) = lookup("STABILITY_SEC") {
            self.index.stability_secs = parse_env_number("STABILITY_SEC", &value)?;
        }

        if let Some(value) = lookup("DEFAULT_PAGE_SIZE") {
            self.search.default_per_page = parse_env_number("DEFAULT_PAGE_SIZE", &value)?;
        }

        if let Some(value) = lookup("MAX_PAGE_SIZE") {
            self.search.max_per_page = parse_env_number("MAX_PAGE_SIZE", &value)?;
        }

        if let Some(value) = lookup("EXCLUDES_FILE") {
            let value = value.trim();
            self.index.excludes_file = (!value.is_empty()).then(|| value.to_string());
        }

        if let Some(value) = lookup("LOG_LEVEL") {
            self.service.log_level = value.trim().to_lowercase();
        }

        if let Some(value) = lookup("BIND_ADDR") {
            self.server.bind = value.trim().to_string();
        }

        Ok(())
    }

    /// Reject limits the query layer cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.search.max_per_page == 0 {
            anyhow::bail!("search.max_per_page must be at least 1");
        }
        if self.search.default_per_page == 0
            || self.search.default_per_page > self.search.max_per_page
        {
            anyhow::bail!(
                "search.default_per_page must be between 1 and {}",
                self.search.max_per_page
            );
        }
        if self.index.roots.is_empty() {
            anyhow::bail!("index.roots must name at least one directory");
        }
        Ok(())
    }
}

impl IndexConfig {
    /// Append the patterns of `excludes_file` to `exclude_patterns`.
    ///
    /// A missing file is logged and ignored; an unreadable one is an error.
    pub fn merge_excludes_file(&mut self) -> Result<usize> {
        let Some(file) = self.excludes_file.as_deref() else {
            return Ok(0);
        };
        let path = Path::new(file);
        if !path.exists() {
            warn!("Excludes file {:?} not found, ignoring", path);
            return Ok(0);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read excludes file: {:?}", path))?;
        let mut added = 0;
        for pattern in parse_excludes(&content) {
            if !self.exclude_patterns.contains(&pattern) {
                self.exclude_patterns.push(pattern);
                added += 1;
            }
        }

        info!("Loaded {} exclude patterns from {:?}", added, path);
        Ok(added)
    }
}

/// One pattern per line; blank lines and `#` comments are skipped
fn parse_excludes(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn parse_env_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: {:?}", key, value))
}
