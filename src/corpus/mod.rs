// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The corpus: catalog items and their embeddings, as one unit.
//!
//! Two artifacts on disk, one logical thing in memory:
//!
//! - `index.slx`: embeddings plus one url fingerprint per row (see [`artifact`])
//! - `metadata.json`: the items, in the same order
//!
//! Parallel arrays drift. Somebody regenerates one file and not the other,
//! and every result silently points at the wrong item. So the loader checks
//! alignment on every load: same count, and every row's stored fingerprint
//! must equal the FNV-1a of the metadata `url` at that position. Any
//! disagreement is [`CorpusError::Corrupt`], never a best-effort load.

pub mod artifact;
mod build;
mod catalog;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::embed::{EmbedError, Embedder};
use crate::index::VectorIndex;
use crate::types::Item;
use crate::util::{url_fingerprint, write_atomic};
use artifact::IndexArtifact;

pub use build::{build_corpus, build_corpus_with_progress, canonical_text};
pub use catalog::parse_items;

/// File name of the index artifact inside an artifacts directory.
pub const INDEX_FILE: &str = "index.slx";

/// File name of the metadata artifact inside an artifacts directory.
pub const METADATA_FILE: &str = "metadata.json";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus unavailable: {path}: {reason}. Run `shortlist build` to create it")]
    Unavailable { path: PathBuf, reason: String },

    #[error("corpus artifact {path} is corrupt: {detail}. Rebuild with `shortlist build`")]
    Corrupt { path: PathBuf, detail: String },

    #[error("catalog is empty, nothing to index")]
    EmptyCatalog,

    #[error("item {position} embedded to {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Embedding(#[from] EmbedError),

    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl CorpusError {
    fn corrupt(path: &Path, detail: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ============================================================================
// PATHS
// ============================================================================

/// Where the loader looks for the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub index: PathBuf,
    pub metadata: PathBuf,
    /// Raw catalog snapshot used when `metadata` is missing.
    pub catalog: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Standard file names inside `dir`, no catalog fallback.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            index: dir.join(INDEX_FILE),
            metadata: dir.join(METADATA_FILE),
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: impl Into<PathBuf>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }
}

// ============================================================================
// CORPUS
// ============================================================================

/// Items plus their index, positionally aligned. Immutable once built.
#[derive(Debug, Clone)]
pub struct Corpus {
    items: Vec<Item>,
    index: VectorIndex,
    embedder_id: String,
}

impl Corpus {
    /// The degraded corpus: no items, every search returns nothing.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            index: VectorIndex::new(0),
            embedder_id: String::new(),
        }
    }

    pub(crate) fn from_parts(items: Vec<Item>, index: VectorIndex, embedder_id: String) -> Self {
        debug_assert_eq!(items.len(), index.len());
        Self {
            items,
            index,
            embedder_id,
        }
    }

    /// Number of loaded items.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&Item> {
        self.items.get(position)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    /// The index artifact for this corpus.
    pub fn to_artifact(&self) -> IndexArtifact {
        IndexArtifact {
            embedder_id: self.embedder_id.clone(),
            dimension: self.index.dimension(),
            fingerprints: self.items.iter().map(|item| url_fingerprint(&item.url)).collect(),
            vectors: self.index.as_flat().to_vec(),
        }
    }

    /// Write `index.slx` and `metadata.json` into `dir`, creating it if needed.
    ///
    /// Each file is replaced atomically. Readers see the old file or the
    /// new one, never half of either.
    pub fn write(&self, dir: &Path) -> Result<ArtifactPaths, CorpusError> {
        fs::create_dir_all(dir).map_err(|e| CorpusError::io(dir, e))?;
        let paths = ArtifactPaths::in_dir(dir);

        let index_bytes = self
            .to_artifact()
            .to_bytes()
            .map_err(|e| CorpusError::corrupt(&paths.index, e.to_string()))?;
        let metadata_bytes =
            serde_json::to_vec_pretty(&self.items).map_err(|source| CorpusError::Json {
                path: paths.metadata.clone(),
                source,
            })?;

        write_atomic(&paths.index, &index_bytes).map_err(|e| CorpusError::io(&paths.index, e))?;
        write_atomic(&paths.metadata, &metadata_bytes)
            .map_err(|e| CorpusError::io(&paths.metadata, e))?;

        info!(
            dir = %dir.display(),
            items = self.size(),
            index_bytes = index_bytes.len(),
            "wrote corpus artifacts"
        );
        Ok(paths)
    }

    /// Load and verify a corpus built by `embedder`.
    pub fn load(paths: &ArtifactPaths, embedder: &dyn Embedder) -> Result<Self, CorpusError> {
        let artifact = read_index(&paths.index)?;

        if artifact.embedder_id != embedder.id() {
            return Err(CorpusError::corrupt(
                &paths.index,
                format!(
                    "built with embedder '{}', configured embedder is '{}'",
                    artifact.embedder_id,
                    embedder.id()
                ),
            ));
        }
        if artifact.count() > 0 && artifact.dimension != embedder.dimension() {
            return Err(CorpusError::corrupt(
                &paths.index,
                format!(
                    "index has {} dimensions, embedder produces {}",
                    artifact.dimension,
                    embedder.dimension()
                ),
            ));
        }

        let (items, items_path) = read_items(paths)?;

        if items.len() != artifact.count() {
            return Err(CorpusError::corrupt(
                &items_path,
                format!(
                    "{} metadata records but {} embeddings",
                    items.len(),
                    artifact.count()
                ),
            ));
        }
        if let Some(row) = items
            .iter()
            .zip(&artifact.fingerprints)
            .position(|(item, &fp)| url_fingerprint(&item.url) != fp)
        {
            return Err(CorpusError::corrupt(
                &items_path,
                format!(
                    "row {row} ({}) does not match its embedding fingerprint",
                    items[row].url
                ),
            ));
        }

        let embedder_id = artifact.embedder_id;
        let index = VectorIndex::from_flat(artifact.dimension, artifact.vectors)
            .ok_or_else(|| CorpusError::corrupt(&paths.index, "ragged vector section"))?;

        info!(
            items = items.len(),
            dimension = index.dimension(),
            embedder = %embedder_id,
            "loaded corpus"
        );
        Ok(Self::from_parts(items, index, embedder_id))
    }
}

fn read_index(path: &Path) -> Result<IndexArtifact, CorpusError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CorpusError::Unavailable {
                path: path.to_path_buf(),
                reason: "index artifact not found".to_string(),
            })
        }
        Err(e) => return Err(CorpusError::io(path, e)),
    };
    IndexArtifact::from_bytes(&bytes).map_err(|e| CorpusError::corrupt(path, e.to_string()))
}

/// Metadata artifact, or the raw catalog when the artifact is missing.
fn read_items(paths: &ArtifactPaths) -> Result<(Vec<Item>, PathBuf), CorpusError> {
    match fs::read_to_string(&paths.metadata) {
        Ok(json) => {
            let items = serde_json::from_str(&json).map_err(|source| CorpusError::Json {
                path: paths.metadata.clone(),
                source,
            })?;
            return Ok((items, paths.metadata.clone()));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(CorpusError::io(&paths.metadata, e)),
    }

    let Some(catalog) = &paths.catalog else {
        return Err(CorpusError::Unavailable {
            path: paths.metadata.clone(),
            reason: "metadata artifact not found and no catalog fallback configured".to_string(),
        });
    };

    let json = match fs::read_to_string(catalog) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CorpusError::Unavailable {
                path: paths.metadata.clone(),
                reason: format!(
                    "metadata artifact not found, catalog fallback {} not found either",
                    catalog.display()
                ),
            })
        }
        Err(e) => return Err(CorpusError::io(catalog, e)),
    };

    warn!(
        metadata = %paths.metadata.display(),
        catalog = %catalog.display(),
        "metadata artifact missing, falling back to raw catalog"
    );
    let items = parse_items(&json).map_err(|source| CorpusError::Json {
        path: catalog.clone(),
        source,
    })?;
    Ok((items, catalog.clone()))
}
