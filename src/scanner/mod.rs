//! Scanner module for directory traversal and content hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk, with a walkdir fallback
//! - Streaming partial/full content hashing with a configurable algorithm
//! - Glob-style file name filtering
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Incremental content hashing (partial or full)
//!
//! # Example
//!
//! ```no_run
//! use partdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     name_filter: Some("*.iso".to_string()),
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for file in walker.walk().unwrap() {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{
    hash_bytes, hash_file, hash_reader, Algorithm, HashPolicy, HashResult, DEFAULT_BUFFER_SIZE,
    DEFAULT_PARTIAL_SIZE, DEFAULT_START_POSITION,
};
pub use walker::Walker;

/// Metadata for a discovered file.
///
/// Contains the two facts duplicate detection needs: where the file is
/// and how many bytes it holds. Entries are created by the walker and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Glob-style file name pattern. Files whose names do not match are
    /// skipped. `None` matches everything.
    pub name_filter: Option<String>,

    /// Descend into subdirectories. When false, only the root directory's
    /// immediate children are considered.
    pub recursive: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            name_filter: None,
            recursive: true,
        }
    }
}

impl WalkerConfig {
    /// Create a new configuration.
    ///
    /// # Arguments
    ///
    /// * `name_filter` - Glob pattern for file names, `None` for match-all
    /// * `recursive` - Whether to descend into subdirectories
    #[must_use]
    pub fn new(name_filter: Option<String>, recursive: bool) -> Self {
        Self {
            name_filter,
            recursive,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when listing a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The name filter is not a valid glob pattern.
    #[error("Invalid name filter '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// The underlying glob error
        #[source]
        source: globset::Error,
    },

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during content hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configured read buffer size is zero.
    #[error("Buffer size must be positive")]
    InvalidBufferSize,

    /// The configured start offset exceeds the supported range.
    #[error("Start position {start} exceeds the {limit} byte limit")]
    StartBeyondLimit {
        /// Requested start offset
        start: u64,
        /// Maximum supported offset
        limit: u64,
    },

    /// A read returned zero bytes before the requested range was consumed.
    ///
    /// This indicates the source shrank (or lied about its length) after
    /// the hashing policy was decided. It is never expected for a
    /// well-formed file.
    #[error("Short read for {path}: {remaining} of {expected} bytes left unread")]
    ShortRead {
        /// Path being hashed
        path: PathBuf,
        /// Bytes the policy asked to hash
        expected: u64,
        /// Bytes still outstanding when the read returned zero
        remaining: u64,
    },

    /// The requested digest algorithm name is not recognized.
    #[error("Unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
}

impl HashError {
    /// Classify a raw I/O error against the path that produced it.
    pub(crate) fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
