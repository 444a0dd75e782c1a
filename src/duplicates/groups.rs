//! Duplicate grouping keys and size-based file organization.
//!
//! # Overview
//!
//! This module provides the [`GroupKey`] identity used to bucket
//! candidate duplicates and the size pre-filter, the first stage of
//! duplicate detection. Grouping by exact size eliminates most
//! non-duplicates instantly since files with different sizes cannot have
//! identical content.
//!
//! # Example
//!
//! ```
//! use partdupe::scanner::FileEntry;
//! use partdupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! // Only groups with 2+ files are potential duplicates
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::scanner::{hasher::hash_to_hex, FileEntry};

/// Composite identity used to bucket candidate duplicates.
///
/// Two files share a key only when their digests, lengths, and
/// partial-hash status all match. The partial marker keeps a partial
/// digest from ever colliding with a full digest of the same bytes: a
/// partial match is a candidate, a full match is proof.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    /// Raw digest bytes
    pub digest: Vec<u8>,
    /// File length in bytes
    pub length: u64,
    /// Whether the digest covers only a partial range
    pub partial: bool,
}

impl GroupKey {
    /// Create a new group key.
    #[must_use]
    pub fn new(digest: Vec<u8>, length: u64, partial: bool) -> Self {
        Self {
            digest,
            length,
            partial,
        }
    }
}

impl fmt::Display for GroupKey {
    /// Renders as `digest:length`, with a `:partial` marker appended for
    /// partial-range digests.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hash_to_hex(&self.digest), self.length)?;
        if self.partial {
            write!(f, ":partial")?;
        }
        Ok(())
    }
}

/// Final mapping from group key to the files sharing it.
///
/// Insertion order within a group is discovery order. Every group
/// retained by the pipeline has at least two members.
pub type DuplicateMap = HashMap<GroupKey, Vec<FileEntry>>;

/// Render a [`DuplicateMap`] with string keys, sorted for stable output.
#[must_use]
pub fn render_map(map: &DuplicateMap) -> BTreeMap<String, Vec<FileEntry>> {
    map.iter()
        .map(|(key, files)| (key.to_string(), files.clone()))
        .collect()
}

/// Statistics from the size grouping stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of empty files encountered (size 0, skipped)
    pub empty_files: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (stage 1 of duplicate detection).
///
/// Files with different sizes cannot be duplicates, so grouping by exact
/// size typically eliminates the bulk of candidates without any I/O.
/// Only groups with 2+ files are returned.
///
/// Zero-length files are skipped with a warning; the walker already
/// excludes them, so seeing one here means the caller fed entries from
/// another source.
///
/// # Arguments
///
/// * `files` - Iterator of file entries to group
///
/// # Returns
///
/// A tuple of:
/// - `HashMap<u64, Vec<FileEntry>>` - Files grouped by size (only groups with 2+ files)
/// - [`GroupingStats`] - Statistics about the grouping operation
///
/// # Example
///
/// ```
/// use partdupe::scanner::FileEntry;
/// use partdupe::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100),
///     FileEntry::new(PathBuf::from("/b.txt"), 100),
///     FileEntry::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (groups, stats) = group_by_size(files);
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
) -> (HashMap<u64, Vec<FileEntry>>, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    let mut stats = GroupingStats::default();

    // First pass: group all files by size
    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;

        if file.size == 0 {
            stats.empty_files += 1;
            log::debug!("Empty file encountered: {}", file.path.display());
            continue;
        }

        all_groups.entry(file.size).or_default().push(file);
    }

    if stats.empty_files > 0 {
        log::warn!(
            "Skipped {} empty file(s) - empty files are never content duplicates",
            stats.empty_files
        );
    }

    stats.unique_sizes = all_groups.len();

    // Second pass: filter to only groups with 2+ files
    let filtered_groups: HashMap<u64, Vec<FileEntry>> = all_groups
        .into_iter()
        .filter(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    size,
                    files[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size group {} bytes: {} potential duplicates",
                    size,
                    files.len()
                );
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping complete: {} files -> {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered_groups, stats)
}

/// Remove every key whose member count is exactly 1.
///
/// Singleton groups cannot represent duplicates, so each grouping stage
/// ends with this cleanup.
#[must_use]
pub fn prune_singletons(map: DuplicateMap) -> DuplicateMap {
    map.into_iter()
        .filter(|(key, files)| {
            if files.len() < 2 {
                log::trace!("Pruned singleton group {key}");
                false
            } else {
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_file(path: &str, size: u64) -> FileEntry {
        FileEntry::new(PathBuf::from(path), size)
    }

    #[test]
    fn test_group_key_display_full() {
        let key = GroupKey::new(vec![0xab, 0xcd], 1024, false);
        assert_eq!(key.to_string(), "abcd:1024");
    }

    #[test]
    fn test_group_key_display_partial_marker() {
        let key = GroupKey::new(vec![0xab, 0xcd], 1024, true);
        assert_eq!(key.to_string(), "abcd:1024:partial");
    }

    #[test]
    fn test_group_key_partial_never_equals_full() {
        let partial = GroupKey::new(vec![1, 2, 3], 10, true);
        let full = GroupKey::new(vec![1, 2, 3], 10, false);
        assert_ne!(partial, full);
    }

    #[test]
    fn test_group_by_size_empty_input() {
        let files: Vec<FileEntry> = vec![];
        let (groups, stats) = group_by_size(files);

        assert!(groups.is_empty());
        assert_eq!(stats.total_files, 0);
        assert_eq!(stats.unique_sizes, 0);
        assert_eq!(stats.potential_duplicates, 0);
    }

    #[test]
    fn test_group_by_size_all_unique() {
        let files = vec![
            make_file("/a.txt", 100),
            make_file("/b.txt", 200),
            make_file("/c.txt", 300),
        ];
        let (groups, stats) = group_by_size(files);

        assert!(groups.is_empty());
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.unique_sizes, 3);
        assert_eq!(stats.eliminated_unique, 3);
        assert_eq!(stats.potential_duplicates, 0);
    }

    #[test]
    fn test_group_by_size_with_duplicates() {
        let files = vec![
            make_file("/a.txt", 100),
            make_file("/b.txt", 100),
            make_file("/c.txt", 200),
        ];
        let (groups, stats) = group_by_size(files);

        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key(&100));
        assert_eq!(groups[&100].len(), 2);

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.unique_sizes, 2);
        assert_eq!(stats.eliminated_unique, 1);
        assert_eq!(stats.potential_duplicates, 2);
        assert_eq!(stats.duplicate_groups, 1);
    }

    #[test]
    fn test_group_by_size_multiple_groups() {
        let files = vec![
            make_file("/a1.txt", 100),
            make_file("/a2.txt", 100),
            make_file("/b1.txt", 200),
            make_file("/b2.txt", 200),
            make_file("/b3.txt", 200),
            make_file("/c.txt", 300), // unique
        ];
        let (groups, stats) = group_by_size(files);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&100].len(), 2);
        assert_eq!(groups[&200].len(), 3);

        assert_eq!(stats.total_files, 6);
        assert_eq!(stats.unique_sizes, 3);
        assert_eq!(stats.eliminated_unique, 1);
        assert_eq!(stats.potential_duplicates, 5);
        assert_eq!(stats.duplicate_groups, 2);
    }

    #[test]
    fn test_group_by_size_empty_files_skipped() {
        let files = vec![
            make_file("/empty1.txt", 0),
            make_file("/empty2.txt", 0),
            make_file("/normal.txt", 100),
        ];
        let (groups, stats) = group_by_size(files);

        assert!(groups.is_empty());
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.empty_files, 2);
        assert_eq!(stats.eliminated_unique, 1);
    }

    #[test]
    fn test_group_by_size_preserves_discovery_order() {
        let files = vec![
            make_file("/first.txt", 100),
            make_file("/second.txt", 100),
            make_file("/third.txt", 100),
        ];
        let (groups, _) = group_by_size(files);

        let paths: Vec<_> = groups[&100]
            .iter()
            .map(|f| f.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, ["/first.txt", "/second.txt", "/third.txt"]);
    }

    #[test]
    fn test_group_by_size_elimination_rate() {
        let files = vec![
            make_file("/a.txt", 100),
            make_file("/b.txt", 100),
            make_file("/c.txt", 200),
            make_file("/d.txt", 300),
        ];
        let (_, stats) = group_by_size(files);

        // 2 unique files eliminated out of 4 total = 50%
        assert!((stats.elimination_rate() - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_grouping_stats_elimination_rate_empty() {
        let stats = GroupingStats::default();
        assert_eq!(stats.elimination_rate(), 0.0);
    }

    #[test]
    fn test_prune_singletons() {
        let mut map = DuplicateMap::new();
        map.insert(
            GroupKey::new(vec![1], 10, false),
            vec![make_file("/a", 10), make_file("/b", 10)],
        );
        map.insert(GroupKey::new(vec![2], 20, false), vec![make_file("/c", 20)]);

        let pruned = prune_singletons(map);

        assert_eq!(pruned.len(), 1);
        assert!(pruned.contains_key(&GroupKey::new(vec![1], 10, false)));
    }

    #[test]
    fn test_render_map_sorted_string_keys() {
        let mut map = DuplicateMap::new();
        map.insert(
            GroupKey::new(vec![0xbb], 10, false),
            vec![make_file("/a", 10), make_file("/b", 10)],
        );
        map.insert(
            GroupKey::new(vec![0xaa], 20, true),
            vec![make_file("/c", 20), make_file("/d", 20)],
        );

        let rendered = render_map(&map);
        let keys: Vec<_> = rendered.keys().cloned().collect();

        assert_eq!(keys, ["aa:20:partial", "bb:10"]);
    }

    #[test]
    fn test_large_file_count_performance() {
        // Grouping 100,000 files is metadata only, no I/O.
        use std::time::Instant;

        let files: Vec<FileEntry> = (0..100_000)
            .map(|i| {
                // Roughly 50% unique, 50% duplicates
                let size = if i % 2 == 0 {
                    i as u64
                } else {
                    (i / 100) as u64
                };
                make_file(&format!("/file{}.txt", i), size)
            })
            .collect();

        let start = Instant::now();
        let (groups, stats) = group_by_size(files);
        let elapsed = start.elapsed();

        assert_eq!(stats.total_files, 100_000);
        assert!(!groups.is_empty());
        assert!(
            elapsed.as_secs() < 1,
            "Grouping took too long: {:?}",
            elapsed
        );
    }
}
