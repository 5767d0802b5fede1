//! Build → write → load preserves the corpus exactly.

use std::fs;
use std::sync::Arc;

use crate::common::{hash_embedder, make_item, sample_items, write_sample_artifacts, SAMPLE_SIZE};
use shortlist::{build_corpus, ArtifactPaths, Corpus, Retriever};

#[test]
fn test_load_preserves_order_and_length() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());

    let loaded = Corpus::load(&paths, hash_embedder().as_ref()).unwrap();

    assert_eq!(loaded.size(), SAMPLE_SIZE);
    let sample = sample_items();
    let expected: Vec<&str> = sample.iter().map(|i| i.url.as_str()).collect();
    let actual: Vec<&str> = loaded.items().iter().map(|i| i.url.as_str()).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_collector_fields_survive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sample_artifacts(dir.path());

    let loaded = Corpus::load(&paths, hash_embedder().as_ref()).unwrap();
    assert_eq!(loaded.items(), sample_items().as_slice());
}

#[test]
fn test_unknown_fields_survive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut item = make_item("https://example.com/view/gsa/", "Global Skills Assessment", &["C"]);
    item.extra
        .insert("job_levels".to_string(), serde_json::json!(["Graduate", "Manager"]));

    let embedder = hash_embedder();
    let corpus = build_corpus(vec![item.clone()], embedder.as_ref()).unwrap();
    let paths = corpus.write(dir.path()).unwrap();

    let loaded = Corpus::load(&paths, embedder.as_ref()).unwrap();
    assert_eq!(loaded.items()[0], item);
}

#[test]
fn test_loaded_corpus_searches_like_built_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = hash_embedder();
    let built = build_corpus(sample_items(), embedder.as_ref()).unwrap();
    let paths = built.write(dir.path()).unwrap();
    let loaded = Corpus::load(&paths, embedder.as_ref()).unwrap();

    let a = Retriever::new(Arc::new(built), Arc::clone(&embedder));
    let b = Retriever::new(Arc::new(loaded), embedder);
    for query in ["java developer", "sales", "numerical reasoning", "sql"] {
        assert_eq!(a.search(query, 5).unwrap(), b.search(query, 5).unwrap(), "{query}");
    }
}

#[test]
fn test_artifact_bytes_are_reproducible() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let a = write_sample_artifacts(first.path());
    let b = write_sample_artifacts(second.path());

    assert_eq!(fs::read(&a.index).unwrap(), fs::read(&b.index).unwrap());
    assert_eq!(fs::read(&a.metadata).unwrap(), fs::read(&b.metadata).unwrap());
}

#[test]
fn test_rewrite_replaces_previous_corpus() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_artifacts(dir.path());

    let embedder = hash_embedder();
    let smaller = build_corpus(sample_items().into_iter().take(2).collect(), embedder.as_ref()).unwrap();
    smaller.write(dir.path()).unwrap();

    let loaded = Corpus::load(&ArtifactPaths::in_dir(dir.path()), embedder.as_ref()).unwrap();
    assert_eq!(loaded.size(), 2);
}

#[test]
fn test_write_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let paths = write_sample_artifacts(&nested);
    assert!(paths.index.exists());
    assert!(paths.metadata.exists());
}
