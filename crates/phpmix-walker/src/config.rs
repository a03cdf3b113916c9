//! Walker configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Glob patterns, matched against forward-slash-normalized relative paths. A
    /// match prunes a directory's subtree or skips a file outright. Skip wins over
    /// keep when both match the same entry.
    pub skip: Vec<String>,
    /// Glob patterns for entries that bypass the obfuscation pipeline entirely and
    /// are mirrored byte-for-byte under `target/<rel>` instead of
    /// `target/obfuscated/<rel>`.
    pub keep: Vec<String>,
    pub follow_symlinks: bool,
    /// Case-insensitive file extensions (without the leading dot) routed through the
    /// Pipeline Orchestrator; everything else is byte-copied.
    pub php_extensions: Vec<String>,
    pub abort_on_error: bool,
    /// Remove the target directory before walking. Refused when the resolved path is
    /// a filesystem root, the current directory, or an ancestor of it.
    pub clean: bool,
    /// Reports what would be written without touching the target directory.
    pub dry_run: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            keep: Vec::new(),
            follow_symlinks: false,
            php_extensions: vec!["php".to_string()],
            abort_on_error: false,
            clean: false,
            dry_run: false,
        }
    }
}
