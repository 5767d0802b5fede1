// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The strict contract.
//!
//! Consumers of this shape parse it with fixed schemas, so every field is
//! always present and always the same type, whatever the collector wrote.
//! Repair, never reject: a record with a garbage duration still shows up,
//! with `duration: 0`.
//!
//! Field order is part of the contract: `url`, `name`, `adaptive_support`,
//! `description`, `duration`, `remote_support`, `test_type`.

use serde::{Deserialize, Serialize};

use crate::types::{Flag, Item, SearchResult};

/// At most this many assessments, whatever `top_k` asked for.
pub const STRICT_RESULT_LIMIT: usize = 10;

/// Descriptions are clamped to this many characters (Unicode scalar values).
pub const DESCRIPTION_MAX_CHARS: usize = 300;

/// Stand-in when an item has no test type codes.
pub const UNKNOWN_TEST_TYPE: &str = "Unknown";

/// One normalized assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictAssessment {
    pub url: String,
    pub name: String,
    pub adaptive_support: String,
    pub description: String,
    pub duration: u64,
    pub remote_support: String,
    pub test_type: Vec<String>,
}

/// Body of a `POST /recommend` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictResponse {
    pub recommended_assessments: Vec<StrictAssessment>,
}

/// Normalize the first [`STRICT_RESULT_LIMIT`] hits. Pure and total.
pub fn format_strict(result: &SearchResult) -> StrictResponse {
    StrictResponse {
        recommended_assessments: result
            .items()
            .take(STRICT_RESULT_LIMIT)
            .map(normalize_item)
            .collect(),
    }
}

pub fn normalize_item(item: &Item) -> StrictAssessment {
    let mut test_type: Vec<String> = item
        .test_type_codes()
        .into_iter()
        .map(str::to_owned)
        .collect();
    if test_type.is_empty() {
        test_type.push(UNKNOWN_TEST_TYPE.to_string());
    }

    StrictAssessment {
        url: item.url.clone(),
        name: item.name.clone(),
        adaptive_support: yes_no(item.adaptive_support.as_ref(), false),
        description: item.description.chars().take(DESCRIPTION_MAX_CHARS).collect(),
        duration: item
            .duration
            .as_ref()
            .and_then(|d| d.whole_minutes())
            .unwrap_or(0),
        remote_support: yes_no(item.remote_support.as_ref(), true),
        test_type,
    }
}

fn yes_no(flag: Option<&Flag>, default: bool) -> String {
    let value = flag.and_then(Flag::as_bool).unwrap_or(default);
    let text = if value { "Yes" } else { "No" };
    text.to_string()
}
