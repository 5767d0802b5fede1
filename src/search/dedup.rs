// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Url-keyed result deduplication.
//!
//! An assessment should appear at most once in a result list. The collector
//! sometimes emits the same page twice (two catalog listings pointing at one
//! product), and both copies get embedded. Position is not identity here;
//! `url` is.
//!
//! `ResultMerger` keys on the url only and keeps the first hit it sees for
//! each. Feed it hits in ranked order and "first" means "closest".
//!
//! **Invariant**: Each url appears at most once in search results.
//!
//! **Verified by**:
//! - `prop_unique_urls` (tests/search/properties.rs)
//! - `test_duplicate_url_keeps_closest` (tests/search/deduplication.rs)

use std::collections::HashSet;

use crate::types::SearchHit;

/// First-occurrence-wins merger keyed on `url`.
///
/// # Example
///
/// ```ignore
/// let mut merger = ResultMerger::with_capacity(hits.len());
/// merger.merge_all(hits);
/// let unique = merger.into_hits();
/// ```
#[derive(Debug, Default)]
pub struct ResultMerger {
    seen: HashSet<String>,
    hits: Vec<SearchHit>,
}

impl ResultMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
            hits: Vec::with_capacity(capacity),
        }
    }

    /// Keep `hit` unless its url was already merged. Returns whether it was kept.
    pub fn merge(&mut self, hit: SearchHit) -> bool {
        // Only url as key: two positions with one url are one assessment
        if self.seen.contains(hit.item.url.as_str()) {
            return false;
        }
        self.seen.insert(hit.item.url.clone());
        self.hits.push(hit);
        true
    }

    pub fn merge_all(&mut self, hits: impl IntoIterator<Item = SearchHit>) {
        for hit in hits {
            self.merge(hit);
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Kept hits, in merge order.
    pub fn into_hits(self) -> Vec<SearchHit> {
        self.hits
    }
}
