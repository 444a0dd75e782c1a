use std::fs;

use partdupe::scanner::{
    hash_bytes, hash_file, Algorithm, HashPolicy, DEFAULT_BUFFER_SIZE, DEFAULT_START_POSITION,
};
use tempfile::tempdir;

#[test]
fn test_hash_file_known_sha1_vector() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("abc.txt");
    fs::write(&path, b"abc").unwrap();

    let result = hash_file(&path, &HashPolicy::default()).unwrap();

    assert_eq!(result.digest_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    assert!(!result.is_partial);
    assert_eq!(result.length, 3);
    assert_eq!(result.hashed_content_size, 3);
    assert_eq!(result.start_position, 0);
    assert_eq!(result.path, path);
}

#[test]
fn test_file_at_threshold_gets_full_hash() {
    // A file of exactly buffer_size + start_position bytes stays on the
    // full-hash side of the boundary.
    let dir = tempdir().unwrap();
    let path = dir.path().join("boundary.bin");
    let policy = HashPolicy::default();
    let size = policy.min_data_length() as usize;
    fs::write(&path, vec![0x5a; size]).unwrap();

    let result = hash_file(&path, &policy).unwrap();

    assert!(!result.is_partial);
    assert_eq!(result.start_position, 0);
    assert_eq!(result.hashed_content_size, size as u64);
}

#[test]
fn test_file_past_threshold_gets_partial_hash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("past.bin");
    let policy = HashPolicy::default();
    let size = policy.min_data_length() as usize + 1;
    fs::write(&path, vec![0x5a; size]).unwrap();

    let result = hash_file(&path, &policy).unwrap();

    assert!(result.is_partial);
    assert_eq!(result.start_position, DEFAULT_START_POSITION);
    assert_eq!(result.hashed_content_size, policy.length);
}

#[test]
fn test_force_full_ignores_thresholds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("forced.bin");
    let size = (DEFAULT_BUFFER_SIZE + DEFAULT_START_POSITION) as usize * 2;
    fs::write(&path, vec![0x11; size]).unwrap();

    let forced = HashPolicy::default().with_force_full(true);
    let result = hash_file(&path, &forced).unwrap();

    assert!(!result.is_partial);
    assert_eq!(result.hashed_content_size, size as u64);
}

#[test]
fn test_partial_digest_matches_window_slice() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("window.bin");

    let mut data = vec![0u8; 300 * 1024];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    fs::write(&path, &data).unwrap();

    let policy = HashPolicy::default();
    let result = hash_file(&path, &policy).unwrap();
    assert!(result.is_partial);

    let start = policy.start_position as usize;
    let end = start + policy.length as usize;
    let window = hash_bytes(&data[start..end], &HashPolicy::full(policy.algorithm)).unwrap();

    assert_eq!(result.digest, window.digest);
}

#[test]
fn test_partial_hash_blind_outside_window() {
    // Two files identical within [start, start + length) but different
    // elsewhere share a partial digest.
    let dir = tempdir().unwrap();
    let policy = HashPolicy::default();
    let size = (policy.min_data_length() + policy.length) as usize;

    let mut a = vec![0xaau8; size];
    let mut b = vec![0xaau8; size];
    a[0] = 1;
    b[0] = 2;
    *a.last_mut().unwrap() = 1;
    *b.last_mut().unwrap() = 2;

    let path_a = dir.path().join("a.bin");
    let path_b = dir.path().join("b.bin");
    fs::write(&path_a, &a).unwrap();
    fs::write(&path_b, &b).unwrap();

    let result_a = hash_file(&path_a, &policy).unwrap();
    let result_b = hash_file(&path_b, &policy).unwrap();

    assert!(result_a.is_partial);
    assert_eq!(result_a.digest, result_b.digest);

    // Full hashes tell them apart.
    let full = HashPolicy::full(policy.algorithm);
    let full_a = hash_file(&path_a, &full).unwrap();
    let full_b = hash_file(&path_b, &full).unwrap();
    assert_ne!(full_a.digest, full_b.digest);
}

#[test]
fn test_all_algorithms_produce_declared_width() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("width.bin");
    fs::write(&path, b"algorithm width check").unwrap();

    for algorithm in [
        Algorithm::Md5,
        Algorithm::Sha1,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
        Algorithm::Blake3,
    ] {
        let result = hash_file(&path, &HashPolicy::full(algorithm)).unwrap();
        assert_eq!(
            result.digest.len(),
            algorithm.digest_len(),
            "digest width mismatch for {algorithm}"
        );
    }
}

#[test]
fn test_hash_missing_file_reports_not_found() {
    let dir = tempdir().unwrap();
    let err = hash_file(&dir.path().join("absent.bin"), &HashPolicy::default()).unwrap_err();
    assert!(err.to_string().contains("not found"), "got: {err}");
}
