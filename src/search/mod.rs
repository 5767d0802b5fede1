// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Retrieval: query string in, ranked and deduplicated hits out.
//!
//! ```text
//! query ──trim──▶ embed ──▶ VectorIndex::search(k) ──▶ ResultMerger ──▶ SearchResult
//! ```
//!
//! Pure reads over an immutable corpus. The same query over the same corpus
//! returns the same list, byte for byte.

pub mod dedup;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::corpus::Corpus;
use crate::embed::{EmbedError, Embedder};
use crate::index::DimensionMismatch;
use crate::types::{SearchHit, SearchResult};
use dedup::ResultMerger;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query is empty")]
    EmptyQuery,

    /// The embedder and the corpus disagree. A deployment defect, not a bad request.
    #[error("embedder/index mismatch: {0}")]
    DimensionMismatch(#[from] DimensionMismatch),

    #[error(transparent)]
    Embedding(#[from] EmbedError),
}

/// The retrieval pipeline over one corpus and the embedder that built it.
#[derive(Clone)]
pub struct Retriever {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(corpus: Arc<Corpus>, embedder: Arc<dyn Embedder>) -> Self {
        Self { corpus, embedder }
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// At most `k` hits, ascending distance, unique urls.
    pub fn search(&self, query: &str, k: usize) -> Result<SearchResult, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if self.corpus.is_empty() || k == 0 {
            return Ok(SearchResult::empty());
        }

        let vector = self.embedder.embed(query)?;
        let neighbors = self.corpus.index().search(&vector, k)?;

        let mut merger = ResultMerger::with_capacity(neighbors.len());
        for neighbor in neighbors {
            if let Some(item) = self.corpus.get(neighbor.position) {
                merger.merge(SearchHit {
                    item: item.clone(),
                    position: neighbor.position,
                    distance: neighbor.distance,
                });
            }
        }

        let hits = merger.into_hits();
        debug!(query, k, hits = hits.len(), "search");
        Ok(SearchResult { hits })
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("items", &self.corpus.size())
            .field("embedder", &self.embedder.id())
            .finish()
    }
}
