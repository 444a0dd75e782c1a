//! Duplicate finder implementation with multi-stage detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Enumeration**: collect candidate files (see [`crate::scanner::Walker`])
//! 2. **Size grouping**: group files by exact size (see [`crate::duplicates::groups`])
//! 3. **Hash grouping**: partial or full content hash per size policy
//! 4. **Disambiguation** (optional): full-hash verification of partial groups
//!
//! Each stage consumes the complete output of the previous one and hands
//! its mapping on by value; no grouping state is shared across stages.
//! The pipeline is strictly sequential - per-file hashing is
//! embarrassingly parallel and could be spread over a worker pool, but
//! the reference pipeline trades that for simplicity and deterministic
//! discovery order.
//!
//! # Example
//!
//! ```no_run
//! use partdupe::duplicates::{find_duplicates, FinderConfig};
//! use std::path::Path;
//!
//! let config = FinderConfig::default().with_test_partial_hash(true);
//! let duplicates = find_duplicates(Path::new("/data"), &config).unwrap();
//! for (key, files) in &duplicates {
//!     println!("{key}: {} copies", files.len());
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytesize::ByteSize;

use super::groups::{group_by_size, prune_singletons, DuplicateMap, GroupKey};
use crate::progress::ProgressCallback;
use crate::scanner::hasher::{DEFAULT_BUFFER_SIZE, DEFAULT_PARTIAL_SIZE, DEFAULT_START_POSITION};
use crate::scanner::{
    hash_file, Algorithm, FileEntry, HashError, HashPolicy, ScanError, Walker, WalkerConfig,
};

/// Progress is reported every this many files.
const PROGRESS_INTERVAL: usize = 10;

/// Files at or above this size always get a progress report (100 MiB).
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Errors that abort a duplicate detection run.
#[derive(thiserror::Error, Debug)]
pub enum FindError {
    /// Enumeration of the root directory failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A candidate file could not be hashed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Configuration for a duplicate detection run.
#[derive(Clone)]
pub struct FinderConfig {
    /// Glob-style file name pattern; `None` matches everything.
    pub name_filter: Option<String>,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Files at or below this size always get a full hash (bytes).
    pub max_partial_size: u64,
    /// Offset of the first byte hashed in partial mode.
    pub start_position: u64,
    /// Digest algorithm for both the partial and the verification pass.
    pub algorithm: Algorithm,
    /// Enable the full-hash disambiguation stage.
    pub test_partial_hash: bool,
    /// Optional progress sink; purely observational.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("name_filter", &self.name_filter)
            .field("recursive", &self.recursive)
            .field("max_partial_size", &self.max_partial_size)
            .field("start_position", &self.start_position)
            .field("algorithm", &self.algorithm)
            .field("test_partial_hash", &self.test_partial_hash)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            name_filter: None,
            recursive: true,
            max_partial_size: DEFAULT_PARTIAL_SIZE,
            start_position: DEFAULT_START_POSITION,
            algorithm: Algorithm::default(),
            test_partial_hash: false,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the glob-style file name filter.
    #[must_use]
    pub fn with_name_filter(mut self, pattern: impl Into<String>) -> Self {
        self.name_filter = Some(pattern.into());
        self
    }

    /// Set whether to descend into subdirectories.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the partial-hash size threshold.
    #[must_use]
    pub fn with_max_partial_size(mut self, bytes: u64) -> Self {
        self.max_partial_size = bytes;
        self
    }

    /// Set the partial-hash start offset.
    #[must_use]
    pub fn with_start_position(mut self, start: u64) -> Self {
        self.start_position = start;
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enable or disable the disambiguation stage.
    #[must_use]
    pub fn with_test_partial_hash(mut self, enabled: bool) -> Self {
        self.test_partial_hash = enabled;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Build the hashing policy for one candidate file.
    ///
    /// A zero `max_partial_size` leaves no window to hash, so every file
    /// gets a full-content hash. Otherwise buffer size is
    /// `min(100 KiB, max_partial_size)`. When `max_partial_size` exceeds
    /// the buffer cap, a partial-eligible file can be shorter than
    /// `start + max_partial_size`; the window is clamped to what the file
    /// actually holds so the countdown read never runs past EOF. The
    /// clamp depends only on the file size, which is part of the group
    /// key, so it is identical for every member of a group.
    fn policy_for(&self, file_size: u64) -> HashPolicy {
        if self.max_partial_size == 0 {
            return HashPolicy::full(self.algorithm);
        }

        let buffer_size = DEFAULT_BUFFER_SIZE.min(self.max_partial_size);
        let mut length = self.max_partial_size;

        let min_data_length = buffer_size.saturating_add(self.start_position);
        if file_size > min_data_length {
            length = length.min(file_size - self.start_position);
        }

        HashPolicy {
            start_position: self.start_position,
            length,
            buffer_size,
            algorithm: self.algorithm,
            force_full: false,
        }
    }

    fn report_phase_start(&self, phase: &str, total: usize) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    fn report_progress(&self, phase: &str, processed: usize, total: usize, file: &FileEntry) {
        // Bounded cadence: every PROGRESS_INTERVAL files, always for the
        // last file, and always for large files.
        let due = processed % PROGRESS_INTERVAL == 0
            || processed == total
            || file.size >= LARGE_FILE_THRESHOLD;
        if !due {
            return;
        }
        if let Some(ref callback) = self.progress_callback {
            let percent = if total == 0 {
                100.0
            } else {
                (processed as f64 / total as f64) * 100.0
            };
            callback.on_progress(phase, file.path.to_string_lossy().as_ref(), percent);
        }
    }

    fn report_phase_end(&self, phase: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(phase);
        }
    }
}

/// Statistics from the hash grouping stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashPhaseStats {
    /// Files that entered the stage
    pub input_files: usize,
    /// Files successfully hashed
    pub hashed_files: usize,
    /// Total bytes fed through hash contexts
    pub bytes_hashed: u64,
    /// Groups with 2+ members after pruning
    pub duplicate_groups: usize,
    /// Files that could still be duplicates
    pub potential_duplicates: usize,
    /// Files eliminated as unique digests
    pub eliminated_unique: usize,
}

/// Statistics from the disambiguation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyStats {
    /// Members of partial groups that entered the stage
    pub input_files: usize,
    /// Files successfully re-hashed in full
    pub hashed_files: usize,
    /// Total bytes fed through hash contexts
    pub bytes_hashed: u64,
    /// Groups confirmed by full-content digests
    pub confirmed_groups: usize,
    /// Files in confirmed groups
    pub confirmed_files: usize,
}

/// Hash every size-group survivor and bucket by (digest, length, partial).
///
/// This is the second stage of duplicate detection. Small files (at or
/// below the partial threshold plus start offset) get a full-content hash;
/// larger files get a bounded-window partial hash. Partial and full
/// digests never share a bucket: the partial flag is part of the key.
/// Singleton keys are discarded before returning.
///
/// All candidates are collected before hashing starts so the total count
/// is known for percent-complete progress reporting.
///
/// # Errors
///
/// A file that cannot be opened or read aborts the stage; the error
/// names the offending path.
pub fn phase_partial_hash(
    size_groups: HashMap<u64, Vec<FileEntry>>,
    config: &FinderConfig,
) -> Result<(DuplicateMap, HashPhaseStats), FindError> {
    let candidates: Vec<FileEntry> = size_groups.into_values().flatten().collect();
    let total = candidates.len();
    let mut stats = HashPhaseStats {
        input_files: total,
        ..Default::default()
    };

    if candidates.is_empty() {
        log::debug!("Hash grouping: no files to process");
        return Ok((DuplicateMap::new(), stats));
    }

    config.report_phase_start("partial-hash", total);
    log::info!("Hash grouping: hashing {total} candidate files");

    let mut groups = DuplicateMap::new();
    for (idx, file) in candidates.into_iter().enumerate() {
        config.report_progress("partial-hash", idx + 1, total, &file);

        if file.size >= LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({}): {}",
                ByteSize(file.size),
                file.path.display()
            );
        }

        let policy = config.policy_for(file.size);
        let result = hash_file(&file.path, &policy)?;
        stats.hashed_files += 1;
        stats.bytes_hashed += result.hashed_content_size;

        log::trace!(
            "{} hash for {}: {}",
            if result.is_partial { "Partial" } else { "Full" },
            file.path.display(),
            result.digest_hex()
        );

        let key = GroupKey::new(result.digest, file.size, result.is_partial);
        groups.entry(key).or_default().push(file);
    }

    config.report_phase_end("partial-hash");

    let before = groups.len();
    let groups = prune_singletons(groups);
    stats.eliminated_unique = before - groups.len();
    stats.duplicate_groups = groups.len();
    stats.potential_duplicates = groups.values().map(Vec::len).sum();

    log::info!(
        "Hash grouping complete: {} files -> {} potential duplicates in {} groups ({} hashed)",
        stats.input_files,
        stats.potential_duplicates,
        stats.duplicate_groups,
        ByteSize(stats.bytes_hashed)
    );

    Ok((groups, stats))
}

/// Replace partial-hash groups with verified full-hash groups.
///
/// The third, optional stage. Every member of a partial-marked group is
/// re-hashed in full with the *same* user-configured algorithm and
/// re-bucketed under its full-content digest; the partial key itself is
/// not carried into the output. Non-partial groups pass through
/// untouched. Singletons produced by the re-bucketing are discarded, so
/// two files that merely shared a window digest end up in no group.
///
/// The input map is consumed and a fresh map is built, keeping ownership
/// of the grouping state unambiguous.
///
/// # Errors
///
/// A file that cannot be re-read aborts the stage.
pub fn disambiguate(
    groups: DuplicateMap,
    config: &FinderConfig,
) -> Result<(DuplicateMap, VerifyStats), FindError> {
    let total: usize = groups
        .iter()
        .filter(|(key, files)| key.partial && files.len() > 1)
        .map(|(_, files)| files.len())
        .sum();
    let mut stats = VerifyStats {
        input_files: total,
        ..Default::default()
    };

    if total == 0 {
        log::debug!("Disambiguation: no partial groups to verify");
        let groups = prune_singletons(groups);
        return Ok((groups, stats));
    }

    config.report_phase_start("full-hash", total);
    log::info!("Disambiguation: verifying {total} files from partial groups");

    let full_policy = HashPolicy::full(config.algorithm);
    let mut verified = DuplicateMap::new();
    let mut processed = 0usize;

    for (key, files) in groups {
        if !key.partial {
            // Full-hash groups are already proven; carry them over.
            verified.entry(key).or_default().extend(files);
            continue;
        }

        if files.len() < 2 {
            // A stricter digest cannot gain a partial singleton any
            // members; drop it without re-reading the file.
            log::trace!("Dropped partial singleton group {key}");
            continue;
        }

        for file in files {
            processed += 1;
            config.report_progress("full-hash", processed, total, &file);

            let result = hash_file(&file.path, &full_policy)?;
            stats.hashed_files += 1;
            stats.bytes_hashed += result.hashed_content_size;

            let full_key = GroupKey::new(result.digest, file.size, false);
            verified.entry(full_key).or_default().push(file);
        }
    }

    config.report_phase_end("full-hash");

    let verified = prune_singletons(verified);
    stats.confirmed_groups = verified.len();
    stats.confirmed_files = verified.values().map(Vec::len).sum();

    log::info!(
        "Disambiguation complete: {} files verified, {} confirmed in {} groups ({} hashed)",
        stats.hashed_files,
        stats.confirmed_files,
        stats.confirmed_groups,
        ByteSize(stats.bytes_hashed)
    );

    Ok((verified, stats))
}

/// Run the full duplicate detection pipeline under a root directory.
///
/// Enumeration, size grouping, hash grouping, and (when
/// `test_partial_hash` is set) full-hash disambiguation, in that order.
/// The run either completes with the full duplicate mapping or fails
/// atomically with an error naming the offending path and operation.
///
/// # Errors
///
/// Returns [`FindError`] when the root cannot be enumerated or a
/// candidate file cannot be hashed.
///
/// # Example
///
/// ```no_run
/// use partdupe::duplicates::{find_duplicates, FinderConfig};
/// use std::path::Path;
///
/// let duplicates = find_duplicates(Path::new("."), &FinderConfig::default()).unwrap();
/// println!("{} duplicate groups", duplicates.len());
/// ```
pub fn find_duplicates(root: &Path, config: &FinderConfig) -> Result<DuplicateMap, FindError> {
    log::info!("Finding duplicates under {}", root.display());
    log::debug!("Configuration: {config:?}");

    config.report_phase_start("walking", 0);
    let walker = Walker::new(
        root,
        WalkerConfig::new(config.name_filter.clone(), config.recursive),
    );
    let files = walker.walk()?;
    config.report_phase_end("walking");

    let (size_groups, size_stats) = group_by_size(files);
    log::debug!(
        "Size grouping: {} groups, {} candidates",
        size_stats.duplicate_groups,
        size_stats.potential_duplicates
    );

    let (groups, _hash_stats) = phase_partial_hash(size_groups, config)?;

    let groups = if config.test_partial_hash {
        let (verified, _verify_stats) = disambiguate(groups, config)?;
        verified
    } else {
        groups
    };

    log::info!(
        "Run complete: {} duplicate groups, {} files",
        groups.len(),
        groups.values().map(Vec::len).sum::<usize>()
    );

    Ok(groups)
}
