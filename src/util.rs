// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Small helpers shared by the corpus builder, the embedder and the loader.

use std::fs;
use std::io;
use std::path::Path;

/// FNV-1a offset basis (64-bit).
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a prime (64-bit).
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// 64-bit FNV-1a over raw bytes.
pub(crate) fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Identity fingerprint of an item, stored next to its embedding.
///
/// The loader recomputes this from the metadata record at the same position
/// and refuses the corpus if any row disagrees.
pub fn url_fingerprint(url: &str) -> u64 {
    fnv1a_64(url.as_bytes())
}

/// Write `bytes` to `path` via a temporary sibling and a rename.
///
/// Readers either see the previous file or the complete new one.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)
}
