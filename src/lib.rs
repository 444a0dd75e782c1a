//! partdupe - Partial-Hash Duplicate File Finder
//!
//! A library for detecting duplicate files through a staged pipeline:
//! enumeration, size grouping, partial content hashing, and optional
//! full-hash verification. Partial hashing reads a bounded window of each
//! file (skipping format headers), so large collections can be compared
//! without reading every byte.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use partdupe::duplicates::{find_duplicates, FinderConfig};
//!
//! let config = FinderConfig::default().with_test_partial_hash(true);
//! let duplicates = find_duplicates(Path::new("/photos"), &config)?;
//! for (key, files) in &duplicates {
//!     println!("{key}: {} copies", files.len());
//! }
//! # Ok::<(), partdupe::duplicates::FindError>(())
//! ```

pub mod config;
pub mod duplicates;
pub mod logging;
pub mod progress;
pub mod scanner;

pub use config::Config;
pub use duplicates::{find_duplicates, DuplicateMap, FindError, FinderConfig};
pub use progress::{Progress, ProgressCallback};
pub use scanner::{Algorithm, FileEntry, HashPolicy, HashResult};
