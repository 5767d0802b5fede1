// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The rich contract: raw records plus a narrative.

use serde::Serialize;

use crate::types::{Item, SearchResult};

/// Upper bound on raw records, whatever `top_k` asked for.
pub const RICH_RESULT_LIMIT: usize = 15;

/// Body of a `POST /strategy` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichResponse {
    pub ai_response: String,
    pub raw_results: Vec<Item>,
}

/// The first `min(k, RICH_RESULT_LIMIT)` records, unmodified, in rank order.
///
/// These are what the narrative is written about and what the response
/// returns, so both see the same list.
pub fn rich_candidates(result: &SearchResult, k: usize) -> Vec<Item> {
    result
        .items()
        .take(k.min(RICH_RESULT_LIMIT))
        .cloned()
        .collect()
}

pub fn format_rich(candidates: Vec<Item>, ai_response: String) -> RichResponse {
    RichResponse {
        ai_response,
        raw_results: candidates,
    }
}
