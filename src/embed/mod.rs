// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Text to vector.
//!
//! The corpus builder and the query path must embed with the same function,
//! or distances mean nothing. The [`Embedder::id`] string is written into the
//! index artifact and checked on load, so a corpus built with one embedder is
//! never queried with another.

mod hash;

pub use hash::HashEmbedder;

use thiserror::Error;

/// Errors from an embedding call.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedder returned {actual} dimensions, expected {expected}")]
    WrongDimension { expected: usize, actual: usize },

    #[error("embedding failed: {0}")]
    Failed(String),
}

/// A deterministic, fixed-dimension text embedding function.
///
/// Implementations must embed each text independently: the vector for a
/// text may not depend on what else is embedded alongside it.
pub trait Embedder: Send + Sync {
    /// Stable identifier stored in the index artifact.
    fn id(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Scale `vector` to unit length. The zero vector stays zero.
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm_sq: f32 = vector.iter().map(|x| x * x).sum();
    if !norm_sq.is_finite() || norm_sq < f32::EPSILON {
        vector.iter_mut().for_each(|x| *x = 0.0);
        return;
    }
    let inv_norm = norm_sq.sqrt().recip();
    vector.iter_mut().for_each(|x| *x *= inv_norm);
}
