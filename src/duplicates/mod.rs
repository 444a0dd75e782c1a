//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (stage 1)
//! - Partial/full hash grouping (stage 2)
//! - Full-hash disambiguation of partial groups (stage 3, optional)
//! - Group key and duplicate map management

pub mod finder;
pub mod groups;

pub use finder::{
    disambiguate, find_duplicates, phase_partial_hash, FindError, FinderConfig, HashPhaseStats,
    VerifyStats,
};
pub use groups::{
    group_by_size, prune_singletons, render_map, DuplicateMap, GroupKey, GroupingStats,
};
