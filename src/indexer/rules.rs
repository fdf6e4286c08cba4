//! Exclusion policy applied during a walk

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::IndexConfig;

/// Compiled exclusion rules
#[derive(Debug, Clone, Default)]
pub struct ScanRules {
    pub(super) prefixes: Vec<PathBuf>,
    pub(super) patterns: Vec<glob::Pattern>,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    pub stability_secs: u64,
}

impl ScanRules {
    pub fn from_config(config: &IndexConfig) -> Self {
        let patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| match glob::Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
                    None
                }
            })
            .collect();

        Self {
            prefixes: config.exclude.iter().map(PathBuf::from).collect(),
            patterns,
            include_hidden: config.include_hidden,
            follow_symlinks: config.follow_symlinks,
            stability_secs: config.stability_secs,
        }
    }

    /// Check if a path below `root` should be excluded.
    ///
    /// Patterns are tried against the absolute path and the path relative to
    /// the root, so both `/data/tmp/**` and `*.log` style rules work.
    pub fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        // Component-wise, so /data/foo does not exclude /data/foobar
        if self.prefixes.iter().any(|prefix| path.starts_with(prefix)) {
            return true;
        }

        if !self.include_hidden {
            if let Some(name) = path.file_name() {
                if name.to_string_lossy().starts_with('.') {
                    return true;
                }
            }
        }

        if self.patterns.is_empty() {
            return false;
        }

        let absolute = path.to_string_lossy();
        let relative = path
            .strip_prefix(root)
            .map(|p| p.to_string_lossy())
            .unwrap_or_else(|_| absolute.clone());

        self.patterns
            .iter()
            .any(|pattern| pattern.matches(&absolute) || pattern.matches(&relative))
    }
}
