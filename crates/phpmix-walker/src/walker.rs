//! The recursive descent driving the Directory Walker. Hand-rolled over
//! `std::fs` rather than `walkdir`'s iterator: the symlink-cycle and
//! follow/reproduce rules need to inspect and act on each entry before deciding
//! whether to recurse at all, which a flat iterator doesn't give us cleanly.

use crate::config::WalkerConfig;
use crate::error::WalkError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use phpmix_obfuscator::ObfuscationContext;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct WalkReport {
    pub processed: usize,
    pub copied: usize,
    pub skipped: usize,
    pub errors: Vec<WalkError>,
}

pub fn run(source: &Path, target: &Path, config: &WalkerConfig, ctx: &mut ObfuscationContext) -> Result<WalkReport, WalkError> {
    let context_dir = target.join("context");
    let obfuscated_dir = target.join("obfuscated");

    if config.clean {
        clean(target)?;
    }

    if !config.dry_run {
        fs::create_dir_all(&obfuscated_dir).map_err(|source| WalkError::Io { path: obfuscated_dir.clone(), source })?;
        fs::create_dir_all(&context_dir).map_err(|source| WalkError::Io { path: context_dir.clone(), source })?;
    }
    ctx.load_into(&context_dir);

    let skip_set = compile_globs(&config.skip)?;
    let keep_set = compile_globs(&config.keep)?;

    let mut walker = Walker {
        source_root: source.to_path_buf(),
        target_root: target.to_path_buf(),
        skip_set,
        keep_set,
        config,
        ctx,
        visited: HashSet::new(),
        report: WalkReport::default(),
    };

    walker.recurse(source, Path::new(""), false);

    if !config.dry_run {
        walker.ctx.save().map_err(WalkError::from)?;
    }

    Ok(walker.report)
}

/// Refuses to remove `target` when it resolves to a filesystem root, the current
/// directory, or an ancestor of it.
fn clean(target: &Path) -> Result<(), WalkError> {
    if !target.exists() {
        return Ok(());
    }
    let canonical_target =
        fs::canonicalize(target).map_err(|source| WalkError::Canonicalize { path: target.to_path_buf(), source })?;
    let canonical_cwd = std::env::current_dir()
        .and_then(fs::canonicalize)
        .map_err(|source| WalkError::Io { path: PathBuf::from("."), source })?;

    if canonical_target.parent().is_none() || canonical_cwd.starts_with(&canonical_target) {
        return Err(WalkError::RefusedCleanTarget(target.to_path_buf()));
    }

    fs::remove_dir_all(&canonical_target).map_err(|source| WalkError::Io { path: target.to_path_buf(), source })
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet, WalkError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| WalkError::InvalidGlob { pattern: pattern.clone(), source })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| WalkError::InvalidGlob { pattern: patterns.join(","), source })
}

struct Walker<'a> {
    source_root: PathBuf,
    target_root: PathBuf,
    skip_set: GlobSet,
    keep_set: GlobSet,
    config: &'a WalkerConfig,
    ctx: &'a mut ObfuscationContext,
    visited: HashSet<PathBuf>,
    report: WalkReport,
}

impl<'a> Walker<'a> {
    /// `rel` is forward-slash-normalized relative to `source_root`. `kept` is true
    /// once an ancestor directory matched a keep pattern, at which point every
    /// descendant is mirrored verbatim under `target/<rel>` rather than run through
    /// the pipeline under `target/obfuscated/<rel>`.
    fn recurse(&mut self, path: &Path, rel: &Path, kept: bool) {
        let rel_str = normalize_rel(rel);

        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.file_type().is_symlink() => self.handle_symlink(path, rel, kept),
            Ok(metadata) if metadata.is_dir() => self.handle_dir(path, rel, &rel_str, kept),
            Ok(_) => self.handle_file(path, rel, &rel_str, kept),
            Err(error) => self.report.errors.push(WalkError::Io { path: path.to_path_buf(), source: error }),
        }
    }

    fn handle_dir(&mut self, path: &Path, rel: &Path, rel_str: &str, kept: bool) {
        if !rel_str.is_empty() {
            if self.skip_set.is_match(rel_str) {
                tracing::debug!("skipping directory `{rel_str}` (skip glob)");
                return;
            }
        }
        if !self.mark_visited(path) {
            return;
        }

        let kept = kept || (!rel_str.is_empty() && self.keep_set.is_match(rel_str));
        let destination = self.mirror_path(rel, kept);
        if !self.config.dry_run {
            if let Err(source) = fs::create_dir_all(&destination) {
                self.report.errors.push(WalkError::Io { path: destination, source });
                return;
            }
        }

        let mut entries: Vec<PathBuf> = match fs::read_dir(path) {
            Ok(read) => read.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(source) => {
                self.report.errors.push(WalkError::Io { path: path.to_path_buf(), source });
                return;
            }
        };
        entries.sort();

        for entry in entries {
            if self.config.abort_on_error && !self.report.errors.is_empty() {
                return;
            }
            let name = entry.file_name().expect("read_dir entries always have a file name");
            self.recurse(&entry, &rel.join(name), kept);
        }
    }

    fn handle_file(&mut self, path: &Path, rel: &Path, rel_str: &str, kept: bool) {
        if self.skip_set.is_match(rel_str) {
            tracing::debug!("skipping file `{rel_str}` (skip glob)");
            self.report.skipped += 1;
            return;
        }
        if !self.mark_visited(path) {
            return;
        }

        let kept = kept || self.keep_set.is_match(rel_str);
        let destination = self.mirror_path(rel, kept);

        if !kept && is_php_extension(path, &self.config.php_extensions) {
            self.process_php_file(path, &destination);
        } else {
            self.copy_file(path, &destination);
        }
    }

    fn handle_symlink(&mut self, path: &Path, rel: &Path, kept: bool) {
        let rel_str = normalize_rel(rel);
        if self.skip_set.is_match(&rel_str) {
            return;
        }
        if !self.mark_visited(path) {
            return;
        }
        let kept = kept || self.keep_set.is_match(&rel_str);
        let destination = self.mirror_path(rel, kept);

        if !self.config.follow_symlinks {
            self.reproduce_symlink(path, &destination);
            return;
        }

        match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => {
                // Resolved target is a directory: copy it recursively, but any
                // symlinks found inside are always reproduced as links, never
                // re-followed.
                self.copy_dir_reproducing_links(path, &destination);
            }
            Ok(_) => self.handle_file(path, rel, &rel_str, kept),
            Err(_) => self.report.errors.push(WalkError::BrokenSymlink { path: path.to_path_buf() }),
        }
    }

    fn copy_dir_reproducing_links(&mut self, path: &Path, destination: &Path) {
        if !self.config.dry_run {
            if let Err(source) = fs::create_dir_all(destination) {
                self.report.errors.push(WalkError::Io { path: destination.to_path_buf(), source });
                return;
            }
        }
        let mut entries: Vec<PathBuf> = match fs::read_dir(path) {
            Ok(read) => read.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(source) => {
                self.report.errors.push(WalkError::Io { path: path.to_path_buf(), source });
                return;
            }
        };
        entries.sort();
        for entry in entries {
            let name = entry.file_name().expect("read_dir entries always have a file name");
            let child_destination = destination.join(name);
            match fs::symlink_metadata(&entry) {
                Ok(metadata) if metadata.file_type().is_symlink() => self.reproduce_symlink(&entry, &child_destination),
                Ok(metadata) if metadata.is_dir() => self.copy_dir_reproducing_links(&entry, &child_destination),
                Ok(_) => self.copy_file(&entry, &child_destination),
                Err(source) => self.report.errors.push(WalkError::Io { path: entry, source }),
            }
        }
    }

    fn reproduce_symlink(&mut self, path: &Path, destination: &Path) {
        if self.config.dry_run {
            return;
        }
        let link_target = match fs::read_link(path) {
            Ok(target) => target,
            Err(source) => {
                self.report.errors.push(WalkError::Io { path: path.to_path_buf(), source });
                return;
            }
        };
        if let Some(parent) = destination.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::remove_file(destination);

        #[cfg(unix)]
        let result = std::os::unix::fs::symlink(&link_target, destination);
        #[cfg(windows)]
        let result = if link_target.is_dir() {
            std::os::windows::fs::symlink_dir(&link_target, destination)
        } else {
            std::os::windows::fs::symlink_file(&link_target, destination)
        };
        #[cfg(not(any(unix, windows)))]
        let result: std::io::Result<()> = fs::copy(&link_target, destination).map(|_| ());

        if let Err(source) = result {
            self.report.errors.push(WalkError::Io { path: destination.to_path_buf(), source });
        }
    }

    fn process_php_file(&mut self, path: &Path, destination: &Path) {
        if self.is_up_to_date(path, destination) {
            self.report.skipped += 1;
            return;
        }

        let source_bytes = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) => {
                self.report.errors.push(WalkError::Io { path: path.to_path_buf(), source });
                return;
            }
        };

        match phpmix_obfuscator::obfuscate_file(&source_bytes, self.ctx) {
            Ok(result) => {
                for diagnostic in &result.diagnostics {
                    tracing::warn!("{}: {}", path.display(), diagnostic.message);
                }
                if !self.config.dry_run {
                    if let Err(source) = write_file(destination, &result.output) {
                        self.report.errors.push(WalkError::Io { path: destination.to_path_buf(), source });
                        return;
                    }
                }
                self.report.processed += 1;
            }
            Err(source) => self.report.errors.push(WalkError::Obfuscator { path: path.to_path_buf(), source }),
        }
    }

    fn copy_file(&mut self, path: &Path, destination: &Path) {
        if self.is_up_to_date(path, destination) {
            self.report.skipped += 1;
            return;
        }
        if self.config.dry_run {
            self.report.copied += 1;
            return;
        }
        if let Some(parent) = destination.parent() {
            if let Err(source) = fs::create_dir_all(parent) {
                self.report.errors.push(WalkError::Io { path: parent.to_path_buf(), source });
                return;
            }
        }
        match fs::copy(path, destination) {
            Ok(_) => self.report.copied += 1,
            Err(source) => self.report.errors.push(WalkError::Io { path: destination.to_path_buf(), source }),
        }
    }

    /// Incremental skip: the destination exists and its mtime is strictly later than
    /// the source's.
    fn is_up_to_date(&self, source: &Path, destination: &Path) -> bool {
        let (Ok(source_meta), Ok(dest_meta)) = (fs::metadata(source), fs::metadata(destination)) else {
            return false;
        };
        let (Ok(source_time), Ok(dest_time)) = (source_meta.modified(), dest_meta.modified()) else {
            return false;
        };
        dest_time > source_time
    }

    fn mirror_path(&self, rel: &Path, kept: bool) -> PathBuf {
        if kept {
            self.target_root.join(rel)
        } else {
            self.target_root.join("obfuscated").join(rel)
        }
    }

    /// Canonicalizes `path` and records it in the visited set. Returns `false` when
    /// canonicalization failed (reported as an error here) or this canonical path was
    /// already visited (a symlink cycle, short-circuited here); `true` otherwise,
    /// meaning the caller should continue processing this entry.
    fn mark_visited(&mut self, path: &Path) -> bool {
        let canonical = match fs::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(source) => {
                self.report.errors.push(WalkError::Canonicalize { path: path.to_path_buf(), source });
                return false;
            }
        };
        self.visited.insert(canonical)
    }
}

fn write_file(destination: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(destination, contents)
}

fn normalize_rel(rel: &Path) -> String {
    rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/")
}

fn is_php_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use phpmix_obfuscator::ObfuscatorConfig;
    use std::fs;
    use tempfile::tempdir;

    fn new_ctx() -> ObfuscationContext {
        let mut config = ObfuscatorConfig::default();
        config.strings.enabled = false;
        ObfuscationContext::new(config)
    }

    #[test]
    fn mirrors_a_php_file_and_byte_copies_a_non_php_file() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("a.php"), "<?php echo 1;").unwrap();
        fs::write(src.path().join("notes.txt"), "hello").unwrap();

        let mut ctx = new_ctx();
        let cfg = WalkerConfig::default();
        let report = run(src.path(), dst.path(), &cfg, &mut ctx).expect("walk succeeds");

        assert_eq!(report.processed, 1);
        assert_eq!(report.copied, 1);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(dst.path().join("obfuscated/a.php").exists());
        assert!(dst.path().join("obfuscated/notes.txt").exists());
    }

    #[test]
    fn skip_glob_prunes_a_directory_entirely() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::create_dir_all(src.path().join("vendor/pkg")).unwrap();
        fs::write(src.path().join("vendor/pkg/lib.php"), "<?php").unwrap();
        fs::write(src.path().join("main.php"), "<?php").unwrap();

        let mut ctx = new_ctx();
        let cfg = WalkerConfig { skip: vec!["vendor/**".to_string()], ..WalkerConfig::default() };
        let report = run(src.path(), dst.path(), &cfg, &mut ctx).expect("walk succeeds");

        assert_eq!(report.processed, 1);
        assert!(!dst.path().join("obfuscated/vendor").exists());
    }

    #[test]
    fn keep_glob_copies_verbatim_outside_the_obfuscated_prefix() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("config.php"), "<?php $x = 1;").unwrap();

        let mut ctx = new_ctx();
        let cfg = WalkerConfig { keep: vec!["config.php".to_string()], ..WalkerConfig::default() };
        let report = run(src.path(), dst.path(), &cfg, &mut ctx).expect("walk succeeds");

        assert_eq!(report.copied, 1);
        assert_eq!(report.processed, 0);
        let kept = fs::read_to_string(dst.path().join("config.php")).unwrap();
        assert_eq!(kept, "<?php $x = 1;");
    }

    #[test]
    fn clean_refuses_to_remove_the_current_directory() {
        let cwd = std::env::current_dir().unwrap();
        let error = clean(&cwd).unwrap_err();
        assert!(matches!(error, WalkError::RefusedCleanTarget(_)));
    }
}
