// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Exact nearest-neighbor search over a flat matrix of embeddings.
//!
//! The catalog is a few hundred items, so brute force is the right index: one
//! pass of squared L2 distances, then a partial selection of the k smallest.
//! No graph, no quantization, no recall tradeoff to explain.
//!
//! # INVARIANTS (DO NOT VIOLATE)
//!
//! 1. **ASCENDING**: results are sorted by distance, ties by corpus position
//! 2. **TOTAL_ORDER**: NaN distances sort after every other distance, the
//!    rest by `f32::total_cmp`
//! 3. **CLAMPED**: `k` larger than the index returns every row, never pads
//! 4. **PARALLEL_EQ**: the rayon path computes the same distances in the same
//!    order as a sequential loop would

use std::cmp::Ordering;

use rayon::prelude::*;
use thiserror::Error;

/// Below this many rows the distance pass stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 1024;

/// A query vector of the wrong length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("query has {actual} dimensions, index has {expected}")]
pub struct DimensionMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// One row of a k-NN answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row in the index, which is also the item's position in the corpus.
    pub position: usize,
    /// Squared L2 distance to the query.
    pub distance: f32,
}

/// Row-major `len × dimension` matrix of `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

impl VectorIndex {
    /// Empty index of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Build from rows. Every row must have `dimension` entries.
    pub fn from_rows(dimension: usize, rows: &[Vec<f32>]) -> Result<Self, DimensionMismatch> {
        let mut vectors = Vec::with_capacity(rows.len() * dimension);
        for row in rows {
            if row.len() != dimension {
                return Err(DimensionMismatch {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            vectors.extend_from_slice(row);
        }
        Ok(Self { dimension, vectors })
    }

    /// Wrap an already-flattened matrix. Returns `None` if the length isn't a
    /// multiple of `dimension`.
    pub fn from_flat(dimension: usize, vectors: Vec<f32>) -> Option<Self> {
        if dimension == 0 {
            return vectors.is_empty().then(|| Self::new(0));
        }
        (vectors.len() % dimension == 0).then_some(Self { dimension, vectors })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat row-major storage.
    pub fn as_flat(&self) -> &[f32] {
        &self.vectors
    }

    pub fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.vectors.get(start..start + self.dimension)
    }

    /// The `k` rows closest to `query`, ascending by distance.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, DimensionMismatch> {
        if query.len() != self.dimension {
            return Err(DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .distances(query)
            .into_iter()
            .enumerate()
            .map(|(position, distance)| Neighbor { position, distance })
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, compare_neighbors);
            neighbors.truncate(k);
        }
        neighbors.sort_by(compare_neighbors);

        Ok(neighbors)
    }

    /// Squared L2 distance from `query` to every row, in row order.
    fn distances(&self, query: &[f32]) -> Vec<f32> {
        if self.len() < PARALLEL_THRESHOLD {
            self.vectors
                .chunks_exact(self.dimension)
                .map(|row| squared_l2(row, query))
                .collect()
        } else {
            // par_chunks_exact is indexed, so collect keeps row order
            self.vectors
                .par_chunks_exact(self.dimension)
                .map(|row| squared_l2(row, query))
                .collect()
        }
    }
}

#[inline]
pub(crate) fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    // total_cmp alone would put a negative NaN first
    a.distance
        .is_nan()
        .cmp(&b.distance.is_nan())
        .then_with(|| a.distance.total_cmp(&b.distance))
        .then_with(|| a.position.cmp(&b.position))
}
