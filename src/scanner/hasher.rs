//! Streaming content hasher with partial-range support.
//!
//! # Overview
//!
//! This module computes a digest over either the full byte content of a
//! file or a bounded byte range, using a configurable algorithm, start
//! offset, range length, and read-buffer size. The partial mode is the
//! workhorse of duplicate detection: hashing a fixed window of a large
//! file is orders of magnitude cheaper than reading it whole, and a
//! mismatch in the window already proves two files differ.
//!
//! # Policy
//!
//! Let `min_data_length = buffer_size + start_position`. A source is
//! hashed in full when `force_full` is set or its total length is at most
//! `min_data_length`; otherwise only the range
//! `[start_position, start_position + length)` is hashed and the result
//! is marked partial. A partial match is a *candidate* duplicate, not a
//! proven one - see [`crate::duplicates::disambiguate`].
//!
//! # Example
//!
//! ```no_run
//! use partdupe::scanner::{hash_file, HashPolicy};
//! use std::path::Path;
//!
//! let policy = HashPolicy::default();
//! let result = hash_file(Path::new("/data/big.iso"), &policy).unwrap();
//! println!("{} partial={}", result.digest_hex(), result.is_partial);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use super::HashError;

/// Default start offset into the file for partial hashing (1000 bytes).
///
/// Skipping the head of the file avoids format headers that are often
/// identical across unrelated files of the same type.
pub const DEFAULT_START_POSITION: u64 = 1000;

/// Default number of bytes hashed in partial mode (100 KiB).
pub const DEFAULT_PARTIAL_SIZE: u64 = 100 * 1024;

/// Default read-buffer size (100 KiB).
pub const DEFAULT_BUFFER_SIZE: u64 = 100 * 1024;

/// Upper bound on `start_position` (1 TiB). Offsets beyond this are
/// rejected as configuration errors before any I/O happens.
pub const MAX_START_POSITION: u64 = 1 << 40;

/// Largest buffer the hasher will actually allocate (16 MiB). A larger
/// configured `buffer_size` still drives the partial/full decision, but
/// reads are chunked through a buffer of at most this size.
const MAX_BUFFER_ALLOC: u64 = 16 * 1024 * 1024;

/// Digest algorithm used for content hashing.
///
/// SHA-1 is the default: it is the fastest of the classic set and a
/// 160-bit digest is ample for bucketing candidate duplicates. MD5 and
/// the SHA-2 family are offered for interoperability with existing file
/// inventories; BLAKE3 for raw speed on large verification passes. None
/// of these are used as security primitives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// MD5 (128-bit)
    Md5,
    /// SHA-1 (160-bit)
    Sha1,
    /// SHA-256 (256-bit)
    Sha256,
    /// SHA-384 (384-bit)
    Sha384,
    /// SHA-512 (512-bit)
    Sha512,
    /// BLAKE3 (256-bit)
    Blake3,
}

impl Algorithm {
    /// Digest width in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 | Self::Blake3 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha384" | "sha-384" => Ok(Self::Sha384),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            "blake3" => Ok(Self::Blake3),
            other => Err(HashError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Incremental hash context, constructed once per hashing call and
/// consumed linearly: any number of `update`s, then one `finalize`.
enum HashContext {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl HashContext {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Md5 => Self::Md5(Md5::new()),
            Algorithm::Sha1 => Self::Sha1(Sha1::new()),
            Algorithm::Sha256 => Self::Sha256(Sha256::new()),
            Algorithm::Sha384 => Self::Sha384(Sha384::new()),
            Algorithm::Sha512 => Self::Sha512(Sha512::new()),
            Algorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Md5(h) => h.finalize().to_vec(),
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha384(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
        }
    }
}

/// How a single hashing call should read its source.
#[derive(Debug, Clone)]
pub struct HashPolicy {
    /// Offset of the first byte hashed in partial mode.
    pub start_position: u64,
    /// Number of bytes hashed in partial mode.
    pub length: u64,
    /// Read-buffer size; chunks fed to the hash context never exceed it.
    pub buffer_size: u64,
    /// Digest algorithm.
    pub algorithm: Algorithm,
    /// Hash the entire content regardless of size thresholds.
    pub force_full: bool,
}

impl Default for HashPolicy {
    fn default() -> Self {
        Self {
            start_position: DEFAULT_START_POSITION,
            length: DEFAULT_PARTIAL_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            algorithm: Algorithm::default(),
            force_full: false,
        }
    }
}

impl HashPolicy {
    /// Policy that always hashes the entire content.
    #[must_use]
    pub fn full(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            force_full: true,
            ..Self::default()
        }
    }

    /// Set the start offset for partial hashing.
    #[must_use]
    pub fn with_start_position(mut self, start: u64) -> Self {
        self.start_position = start;
        self
    }

    /// Set the number of bytes hashed in partial mode.
    #[must_use]
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = length;
        self
    }

    /// Set the read-buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: u64) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Force full-content hashing.
    #[must_use]
    pub fn with_force_full(mut self, force: bool) -> Self {
        self.force_full = force;
        self
    }

    /// Smallest total length above which partial mode applies.
    ///
    /// Sources at or below this length are always hashed in full: the
    /// boundary is inclusive on the full-hash side.
    #[must_use]
    pub fn min_data_length(&self) -> u64 {
        self.buffer_size.saturating_add(self.start_position)
    }

    /// Validate numeric bounds before any I/O.
    fn validate(&self) -> Result<(), HashError> {
        if self.buffer_size == 0 {
            return Err(HashError::InvalidBufferSize);
        }
        if self.start_position > MAX_START_POSITION {
            return Err(HashError::StartBeyondLimit {
                start: self.start_position,
                limit: MAX_START_POSITION,
            });
        }
        Ok(())
    }
}

/// Outcome of one hashing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult {
    /// Path of the hashed file; empty for in-memory sources.
    pub path: PathBuf,
    /// Total length of the source in bytes.
    pub length: u64,
    /// Algorithm that produced the digest.
    pub algorithm: Algorithm,
    /// Raw digest bytes, `algorithm.digest_len()` wide.
    pub digest: Vec<u8>,
    /// True when only a bounded range was hashed.
    pub is_partial: bool,
    /// First hashed byte offset; 0 whenever `is_partial` is false.
    pub start_position: u64,
    /// Number of bytes fed to the hash context; equals `length` whenever
    /// `is_partial` is false.
    pub hashed_content_size: u64,
}

impl HashResult {
    /// Digest rendered as lowercase hex.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }
}

/// Render raw digest bytes as lowercase hex.
#[must_use]
pub fn hash_to_hex(digest: &[u8]) -> String {
    use fmt::Write as _;

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Hash a file's content according to `policy`.
///
/// The file handle and hash context are scoped to this call and released
/// on every exit path. See the module docs for the partial/full decision.
///
/// # Errors
///
/// Returns [`HashError`] when the policy is invalid, the file cannot be
/// opened or read, or a read returns zero bytes before the requested
/// range is consumed.
pub fn hash_file(path: &Path, policy: &HashPolicy) -> Result<HashResult, HashError> {
    policy.validate()?;

    let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
    let length = file
        .metadata()
        .map_err(|e| HashError::from_io(path, e))?
        .len();

    hash_inner(file, length, policy, path)
}

/// Hash a seekable byte source of known total length according to `policy`.
///
/// The returned [`HashResult`] carries an empty path.
///
/// # Errors
///
/// Returns [`HashError`] on an invalid policy, a read failure, or a short
/// read before the requested range is consumed.
pub fn hash_reader<R: Read + Seek>(
    reader: R,
    length: u64,
    policy: &HashPolicy,
) -> Result<HashResult, HashError> {
    policy.validate()?;
    hash_inner(reader, length, policy, Path::new(""))
}

/// Hash an in-memory byte sequence according to `policy`.
///
/// # Errors
///
/// Returns [`HashError`] only for an invalid policy; reads from memory
/// cannot fail.
pub fn hash_bytes(data: &[u8], policy: &HashPolicy) -> Result<HashResult, HashError> {
    hash_reader(Cursor::new(data), data.len() as u64, policy)
}

/// Shared streaming core for file and reader sources.
fn hash_inner<R: Read + Seek>(
    mut reader: R,
    length: u64,
    policy: &HashPolicy,
    path: &Path,
) -> Result<HashResult, HashError> {
    let mut context = HashContext::new(policy.algorithm);
    let buf_len = policy.buffer_size.min(MAX_BUFFER_ALLOC) as usize;
    let mut buffer = vec![0u8; buf_len];

    if policy.force_full || length <= policy.min_data_length() {
        // Full pass: stream everything through the context, no range
        // restriction. start_position is normalized to 0.
        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| HashError::from_io(path, e))?;
            if read == 0 {
                break;
            }
            context.update(&buffer[..read]);
        }

        return Ok(HashResult {
            path: path.to_path_buf(),
            length,
            algorithm: policy.algorithm,
            digest: context.finalize(),
            is_partial: false,
            start_position: 0,
            hashed_content_size: length,
        });
    }

    // Partial pass: seek to the window and count down exactly
    // `policy.length` bytes through the context.
    reader
        .seek(SeekFrom::Start(policy.start_position))
        .map_err(|e| HashError::from_io(path, e))?;

    let mut remaining = policy.length;
    while remaining > 0 {
        let want = remaining.min(buffer.len() as u64) as usize;
        let read = reader
            .read(&mut buffer[..want])
            .map_err(|e| HashError::from_io(path, e))?;
        if read == 0 {
            return Err(HashError::ShortRead {
                path: path.to_path_buf(),
                expected: policy.length,
                remaining,
            });
        }
        context.update(&buffer[..read]);
        remaining -= read as u64;
    }

    Ok(HashResult {
        path: path.to_path_buf(),
        length,
        algorithm: policy.algorithm,
        digest: context.finalize(),
        is_partial: true,
        start_position: policy.start_position,
        hashed_content_size: policy.length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(start: u64, length: u64, buffer: u64) -> HashPolicy {
        HashPolicy::default()
            .with_start_position(start)
            .with_length(length)
            .with_buffer_size(buffer)
    }

    #[test]
    fn test_known_digests_forced_full() {
        let cases = [
            (Algorithm::Md5, "900150983cd24fb0d6963f7d28e17f72"),
            (Algorithm::Sha1, "a9993e364706816aba3e25717850c26c9cd0d89d"),
            (
                Algorithm::Sha256,
                "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            ),
        ];

        for (algorithm, expected) in cases {
            let result = hash_bytes(b"abc", &HashPolicy::full(algorithm)).unwrap();
            assert_eq!(result.digest_hex(), expected, "{algorithm}");
            assert!(!result.is_partial);
            assert_eq!(result.digest.len(), algorithm.digest_len());
        }
    }

    #[test]
    fn test_small_source_hashed_in_full() {
        let data = vec![7u8; 500];
        let result = hash_bytes(&data, &policy(100, 1000, 1000)).unwrap();

        assert!(!result.is_partial);
        assert_eq!(result.start_position, 0);
        assert_eq!(result.hashed_content_size, 500);
        assert_eq!(result.length, 500);
    }

    #[test]
    fn test_boundary_length_is_full_hash() {
        // Exactly buffer_size + start_position bytes: inclusive of full hash.
        let data = vec![1u8; 1100];
        let result = hash_bytes(&data, &policy(100, 1000, 1000)).unwrap();

        assert!(!result.is_partial);
        assert_eq!(result.start_position, 0);
        assert_eq!(result.hashed_content_size, 1100);
    }

    #[test]
    fn test_one_past_boundary_is_partial() {
        let data = vec![1u8; 1101];
        let result = hash_bytes(&data, &policy(100, 1000, 1000)).unwrap();

        assert!(result.is_partial);
        assert_eq!(result.start_position, 100);
        assert_eq!(result.hashed_content_size, 1000);
    }

    #[test]
    fn test_partial_digest_equals_slice_digest() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let partial = hash_bytes(&data, &policy(64, 512, 128)).unwrap();
        assert!(partial.is_partial);

        let slice =
            hash_bytes(&data[64..64 + 512], &HashPolicy::full(Algorithm::default())).unwrap();
        assert_eq!(partial.digest, slice.digest);
    }

    #[test]
    fn test_force_overrides_partial_decision() {
        let data = vec![9u8; 10_000];
        let forced = hash_bytes(&data, &policy(100, 1000, 1000).with_force_full(true)).unwrap();

        assert!(!forced.is_partial);
        assert_eq!(forced.hashed_content_size, 10_000);

        let whole = hash_bytes(&data, &HashPolicy::full(Algorithm::default())).unwrap();
        assert_eq!(forced.digest, whole.digest);
    }

    #[test]
    fn test_partial_chunking_does_not_change_digest() {
        let data: Vec<u8> = (0..8192u32).map(|i| (i % 199) as u8).collect();

        // Same window, different chunk sizes. Buffer size only affects the
        // partial/full decision and read granularity, never the digest.
        // Both buffers keep min_data_length below the source length.
        let a = hash_bytes(&data, &policy(10, 4000, 100)).unwrap();
        let b = hash_bytes(&data, &policy(10, 4000, 1000)).unwrap();

        assert!(a.is_partial && b.is_partial);
        assert_eq!(a.digest, b.digest);
    }

    #[test]
    fn test_short_read_is_an_error() {
        // Declare a length large enough to select partial mode, over a
        // source that cannot satisfy the window.
        let data = vec![0u8; 300];
        let result = hash_reader(Cursor::new(&data), 5000, &policy(100, 1000, 1000));

        match result {
            Err(HashError::ShortRead {
                expected,
                remaining,
                ..
            }) => {
                assert_eq!(expected, 1000);
                assert!(remaining > 0);
            }
            other => panic!("expected ShortRead, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let result = hash_bytes(b"data", &policy(0, 10, 0));
        assert!(matches!(result, Err(HashError::InvalidBufferSize)));
    }

    #[test]
    fn test_start_beyond_limit_rejected() {
        let result = hash_bytes(b"data", &policy(MAX_START_POSITION + 1, 10, 10));
        assert!(matches!(result, Err(HashError::StartBeyondLimit { .. })));
    }

    #[test]
    fn test_algorithm_parse_roundtrip() {
        for algorithm in [
            Algorithm::Md5,
            Algorithm::Sha1,
            Algorithm::Sha256,
            Algorithm::Sha384,
            Algorithm::Sha512,
            Algorithm::Blake3,
        ] {
            let parsed: Algorithm = algorithm.name().parse().unwrap();
            assert_eq!(parsed, algorithm);
        }

        assert!(matches!(
            "crc32".parse::<Algorithm>(),
            Err(HashError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_hash_to_hex() {
        assert_eq!(hash_to_hex(&[0xab, 0x01, 0xff]), "ab01ff");
        assert_eq!(hash_to_hex(&[]), "");
    }

    #[test]
    fn test_empty_source_full_hash() {
        let result = hash_bytes(b"", &HashPolicy::default()).unwrap();

        assert!(!result.is_partial);
        assert_eq!(result.length, 0);
        assert_eq!(result.hashed_content_size, 0);
        // SHA-1 of the empty string.
        assert_eq!(
            result.digest_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }
}
