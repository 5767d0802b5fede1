//! The loader refuses artifacts that disagree with each other.

use std::fs;

use serde_json::Value;

use crate::common::{hash_embedder, write_sample_artifacts, SAMPLE_CATALOG, SAMPLE_SIZE};
use shortlist::corpus::artifact::IndexHeader;
use shortlist::{ArtifactPaths, Corpus, CorpusError};

fn read_metadata(paths: &ArtifactPaths) -> Vec<Value> {
    serde_json::from_str(&fs::read_to_string(&paths.metadata).unwrap()).unwrap()
}

fn write_metadata(paths: &ArtifactPaths, records: &[Value]) {
    fs::write(&paths.metadata, serde_json::to_vec(records).unwrap()).unwrap();
}

fn load(paths: &ArtifactPaths) -> Result<Corpus, CorpusError> {
    Corpus::load(paths, hash_embedder().as_ref())
}

#[test]
fn test_missing_metadata_falls_back_to_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());
    fs::remove_file(&paths.metadata).unwrap();

    let catalog = dir.path().join("products.json");
    fs::write(&catalog, SAMPLE_CATALOG).unwrap();

    let loaded = load(&paths.clone().with_catalog(&catalog)).unwrap();
    assert_eq!(loaded.size(), SAMPLE_SIZE);
}

#[test]
fn test_missing_metadata_without_fallback_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());
    fs::remove_file(&paths.metadata).unwrap();

    assert!(matches!(load(&paths), Err(CorpusError::Unavailable { .. })));

    let missing_catalog = paths.with_catalog(dir.path().join("nope.json"));
    assert!(matches!(
        load(&missing_catalog),
        Err(CorpusError::Unavailable { .. })
    ));
}

#[test]
fn test_metadata_preferred_over_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());

    // A catalog that disagrees with the index is never read while metadata exists
    let catalog = dir.path().join("products.json");
    fs::write(&catalog, "[]").unwrap();

    let loaded = load(&paths.with_catalog(&catalog)).unwrap();
    assert_eq!(loaded.size(), SAMPLE_SIZE);
}

#[test]
fn test_count_mismatch_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());

    let mut records = read_metadata(&paths);
    records.pop();
    write_metadata(&paths, &records);

    let err = load(&paths).unwrap_err();
    assert!(matches!(err, CorpusError::Corrupt { .. }), "{err}");
    assert!(err.to_string().contains("metadata records"));
}

#[test]
fn test_reordered_metadata_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());

    let mut records = read_metadata(&paths);
    records.swap(0, 1);
    write_metadata(&paths, &records);

    let err = load(&paths).unwrap_err();
    assert!(matches!(err, CorpusError::Corrupt { .. }));
    assert!(err.to_string().contains("row 0"), "{err}");
}

#[test]
fn test_edited_url_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());

    let mut records = read_metadata(&paths);
    records[SAMPLE_SIZE - 1]["url"] = Value::String("https://example.com/view/other/".into());
    write_metadata(&paths, &records);

    assert!(matches!(load(&paths), Err(CorpusError::Corrupt { .. })));
}

#[test]
fn test_flipped_vector_byte_fails_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());

    let mut bytes = fs::read(&paths.index).unwrap();
    let header = IndexHeader::read(&mut &bytes[..IndexHeader::SIZE]).unwrap();
    let vectors_start = header.section_offsets().vectors.0;
    bytes[vectors_start + 3] ^= 0x40;
    fs::write(&paths.index, &bytes).unwrap();

    let err = load(&paths).unwrap_err();
    assert!(matches!(err, CorpusError::Corrupt { .. }));
    assert!(err.to_string().contains("CRC32"), "{err}");
}

#[test]
fn test_truncated_index_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());

    let bytes = fs::read(&paths.index).unwrap();
    fs::write(&paths.index, &bytes[..bytes.len() / 2]).unwrap();

    assert!(matches!(load(&paths), Err(CorpusError::Corrupt { .. })));
}

#[test]
fn test_foreign_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());
    fs::write(&paths.index, b"definitely not an index artifact at all, just text").unwrap();

    let err = load(&paths).unwrap_err();
    assert!(matches!(err, CorpusError::Corrupt { .. }));
    assert!(err.to_string().contains("magic"), "{err}");
}

#[test]
fn test_invalid_metadata_json() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());
    fs::write(&paths.metadata, "[{\"url\": ").unwrap();

    assert!(matches!(load(&paths), Err(CorpusError::Json { .. })));
}
