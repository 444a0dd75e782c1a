//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, the enumeration
//! collaborator of the duplicate detection pipeline. It yields one
//! [`FileEntry`] (path, byte length) per regular file under a root
//! directory, optionally recursive, filtered by a glob-style name
//! pattern.
//!
//! Traversal runs on [`jwalk`] (parallel directory reading, sorted
//! streaming results). When the fast strategy cannot list the root due to
//! access restrictions, the walker falls back to a slower walkdir-based
//! pass that skips inaccessible subtrees instead of aborting.
//!
//! Zero-length files are excluded here: they are never duplicates of
//! content and would otherwise all hash identically.
//!
//! # Example
//!
//! ```no_run
//! use partdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files = walker.walk().unwrap();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use jwalk::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for file discovery.
///
/// Uses jwalk for efficient parallel traversal of directory trees, with
/// a single-threaded error-tolerant fallback for restricted roots.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Compile the name filter, if any, into a glob matcher.
    fn build_matcher(&self) -> Result<Option<GlobMatcher>, ScanError> {
        match &self.config.name_filter {
            None => Ok(None),
            Some(pattern) => {
                let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidPattern {
                    pattern: pattern.clone(),
                    source: e,
                })?;
                Ok(Some(glob.compile_matcher()))
            }
        }
    }

    /// Check whether a file name passes the name filter.
    fn matches_name(matcher: &Option<GlobMatcher>, path: &Path) -> bool {
        match matcher {
            None => true,
            Some(m) => path.file_name().is_some_and(|name| m.is_match(name)),
        }
    }

    /// Turn a discovered path into a [`FileEntry`], or `None` when it is
    /// filtered out (directory, symlink, empty, name mismatch).
    fn process_path(&self, path: &Path, matcher: &Option<GlobMatcher>) -> Option<FileEntry> {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                return None;
            }
        };

        if !metadata.is_file() {
            return None;
        }

        if !Self::matches_name(matcher, path) {
            log::trace!("Name filter excluded: {}", path.display());
            return None;
        }

        let size = metadata.len();
        if size == 0 {
            log::debug!("Skipping empty file: {}", path.display());
            return None;
        }

        Some(FileEntry::new(path.to_path_buf(), size))
    }

    /// Walk the directory tree and collect file entries.
    ///
    /// Per-entry errors inside the tree are logged and skipped. When the
    /// root itself cannot be listed by the fast strategy, the walker
    /// retries with the error-tolerant fallback; only a root that neither
    /// strategy can read propagates as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when the root is missing, is not a
    /// directory, carries an invalid name filter, or cannot be listed by
    /// either strategy.
    pub fn walk(&self) -> Result<Vec<FileEntry>, ScanError> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScanError::NotFound(self.root.clone()),
            std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(self.root.clone()),
            _ => ScanError::Io {
                path: self.root.clone(),
                source: e,
            },
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let matcher = self.build_matcher()?;

        match self.walk_fast(&matcher) {
            Ok(files) => Ok(files),
            Err(ScanError::PermissionDenied(path)) => {
                log::warn!(
                    "Fast enumeration denied for {}, falling back to tolerant traversal",
                    path.display()
                );
                self.walk_fallback(&matcher)
            }
            Err(e) => Err(e),
        }
    }

    /// Fast strategy: parallel traversal via jwalk.
    fn walk_fast(&self, matcher: &Option<GlobMatcher>) -> Result<Vec<FileEntry>, ScanError> {
        let max_depth = if self.config.recursive {
            usize::MAX
        } else {
            1
        };

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(false)
            .max_depth(max_depth)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        let mut files = Vec::new();
        for entry_result in walk_dir {
            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    if path == self.root || entry.file_type().is_dir() {
                        continue;
                    }
                    if entry.file_type().is_symlink() {
                        log::trace!("Skipping symlink: {}", path.display());
                        continue;
                    }
                    if let Some(file) = self.process_path(&path, matcher) {
                        files.push(file);
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    let denied = e
                        .io_error()
                        .is_some_and(|io| io.kind() == std::io::ErrorKind::PermissionDenied);
                    if denied && path == self.root {
                        // Root unreadable under the fast strategy; the
                        // caller retries with the tolerant fallback.
                        return Err(ScanError::PermissionDenied(path));
                    }
                    log::warn!("Skipping inaccessible entry {}: {}", path.display(), e);
                }
            }
        }

        log::debug!(
            "Fast enumeration of {} found {} files",
            self.root.display(),
            files.len()
        );
        Ok(files)
    }

    /// Fallback strategy: single-threaded walkdir traversal that skips
    /// inaccessible subtrees rather than aborting.
    fn walk_fallback(&self, matcher: &Option<GlobMatcher>) -> Result<Vec<FileEntry>, ScanError> {
        let max_depth = if self.config.recursive {
            usize::MAX
        } else {
            1
        };

        let mut files = Vec::new();
        for entry_result in walkdir::WalkDir::new(&self.root)
            .follow_links(false)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() || entry.path_is_symlink() {
                        continue;
                    }
                    if let Some(file) = self.process_path(entry.path(), matcher) {
                        files.push(file);
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Skipping inaccessible entry {}: {}", path.display(), e);
                }
            }
        }

        log::debug!(
            "Fallback enumeration of {} found {} files",
            self.root.display(),
            files.len()
        );
        Ok(files)
    }
}
