// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! FNV-1a feature hashing embedder.
//!
//! Not semantic: two texts are close when they share tokens, nothing more.
//! What it buys is determinism and zero setup. No model files, no network,
//! same vector on every machine, and the corpus can be built and queried in a
//! test without fixtures.
//!
//! Each token hashes to one dimension (`hash % dimension`) and adds `+1` or
//! `-1` depending on the top bit of the hash. The result is L2-normalized, so
//! squared L2 distance between two embeddings is `2 - 2·cos`.

use unicode_normalization::UnicodeNormalization;

use super::{l2_normalize, EmbedError, Embedder};
use crate::util::fnv1a_64;

/// Tokens shorter than this (in bytes) carry no signal.
const MIN_TOKEN_LEN: usize = 2;

/// Default dimension.
pub const DEFAULT_DIMENSION: usize = 384;

/// Deterministic hashing embedder.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    id: String,
}

impl HashEmbedder {
    /// Embedder with `dimension` buckets. A zero dimension is bumped to one.
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            id: format!("fnv1a-{dimension}"),
        }
    }

    pub fn default_384() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }

    /// Embedding without the `Result` wrapper; hashing cannot fail.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimension];

        for token in tokenize(text) {
            let hash = fnv1a_64(token.as_bytes());
            let index = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 1 { 1.0 } else { -1.0 };
            embedding[index] += sign;
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::default_384()
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed_sync(text))
    }
}

/// NFKC-fold and lowercase, then split on anything that isn't alphanumeric.
fn tokenize(text: &str) -> Vec<String> {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= MIN_TOKEN_LEN)
        .map(str::to_owned)
        .collect()
}
