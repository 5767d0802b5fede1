// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Offline corpus construction: items in, items + embeddings out.

use rayon::prelude::*;
use tracing::info;

use super::{Corpus, CorpusError};
use crate::embed::Embedder;
use crate::index::VectorIndex;
use crate::types::Item;

/// The text that gets embedded for an item.
///
/// Order matters: test types, then name, then description. Changing this
/// string changes every vector, so a rebuilt corpus would not match old
/// query behavior.
pub fn canonical_text(item: &Item) -> String {
    format!(
        "Test Type: {}. Name: {}. Description: {}",
        item.test_type_codes().join(", "),
        item.name,
        item.description
    )
}

/// Embed every item and assemble a corpus.
pub fn build_corpus(items: Vec<Item>, embedder: &dyn Embedder) -> Result<Corpus, CorpusError> {
    build_corpus_with_progress(items, embedder, &|_| {})
}

/// Like [`build_corpus`], calling `on_embedded` once per item as it finishes.
///
/// Embedding runs in parallel; `on_embedded` may be called from any rayon
/// worker and in any order. The resulting corpus keeps input order.
pub fn build_corpus_with_progress(
    items: Vec<Item>,
    embedder: &dyn Embedder,
    on_embedded: &(dyn Fn(usize) + Sync),
) -> Result<Corpus, CorpusError> {
    if items.is_empty() {
        return Err(CorpusError::EmptyCatalog);
    }

    let vectors = items
        .par_iter()
        .enumerate()
        .map(|(i, item)| -> Result<Vec<f32>, CorpusError> {
            let vector = embedder.embed(&canonical_text(item))?;
            on_embedded(i);
            Ok(vector)
        })
        .collect::<Result<Vec<Vec<f32>>, CorpusError>>()?;

    let dimension = vectors[0].len();
    if let Some(bad) = vectors.iter().position(|v| v.len() != dimension) {
        return Err(CorpusError::DimensionMismatch {
            position: bad,
            expected: dimension,
            actual: vectors[bad].len(),
        });
    }

    let index = VectorIndex::from_rows(dimension, &vectors).map_err(|e| {
        CorpusError::DimensionMismatch {
            position: 0,
            expected: e.expected,
            actual: e.actual,
        }
    })?;

    info!(
        items = items.len(),
        dimension,
        embedder = embedder.id(),
        "built corpus"
    );

    Ok(Corpus::from_parts(items, index, embedder.id().to_string()))
}
