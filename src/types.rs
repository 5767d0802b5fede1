// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Core data types: catalog items, queries, and ranked results.
//!
//! Catalog records come from a web collector, and collectors are sloppy. A
//! duration might be `20`, `20.0`, `"20"` or `"about 20 minutes"`. A flag might
//! be `true` or `"Yes"`. A test type might be `"K"` or `["K", "A"]`. The types
//! here accept all of it and keep the original shape, so the rich contract
//! can hand the record back unmodified. Repair happens later, in one place:
//! the strict formatter (`contract::strict`).
//!
//! The only field that must be well-formed is `url`. It is the identity of an
//! item, and the dedup and alignment checks depend on it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// ITEM FIELDS
// ============================================================================

/// Test type codes, as a single code or a list of codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestTypes {
    One(String),
    Many(Vec<String>),
    /// Anything else the collector produced. Carries no usable codes.
    Other(Value),
}

impl TestTypes {
    /// The non-blank codes, in source order.
    pub fn codes(&self) -> Vec<&str> {
        match self {
            TestTypes::One(code) => vec![code.as_str()],
            TestTypes::Many(codes) => codes.iter().map(String::as_str).collect(),
            TestTypes::Other(_) => Vec::new(),
        }
        .into_iter()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .collect()
    }
}

/// Duration in minutes, as whatever numeric-ish shape the source used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Minutes {
    Whole(i64),
    Fractional(f64),
    Text(String),
    Other(Value),
}

impl Minutes {
    /// Non-negative whole minutes, or `None` if the value is not a number.
    ///
    /// Fractions are truncated toward zero. Negative values clamp to zero.
    pub fn whole_minutes(&self) -> Option<u64> {
        let value = match self {
            Minutes::Whole(n) => return Some(u64::try_from(*n).unwrap_or(0)),
            Minutes::Fractional(f) => *f,
            Minutes::Text(s) => s.trim().parse::<f64>().ok()?,
            Minutes::Other(_) => return None,
        };

        if !value.is_finite() {
            return None;
        }
        // f64 -> u64 casts saturate, negatives become 0
        Some(value.trunc() as u64)
    }
}

/// A boolean-like flag: JSON boolean or "Yes"/"No" style text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Text(String),
    Other(Value),
}

impl Flag {
    /// Interpret the flag, or `None` if it is not recognizably yes or no.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Flag::Bool(b) => Some(*b),
            Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" | "1" => Some(true),
                "no" | "n" | "false" | "0" => Some(false),
                _ => None,
            },
            Flag::Other(_) => None,
        }
    }
}

// ============================================================================
// ITEM
// ============================================================================

/// One catalog entry.
///
/// Fields the collector did not send stay `None` and are not serialized back.
/// Fields this crate does not know about are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub url: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<TestTypes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Minutes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_support: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_support: Option<Flag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Minimal item with only identity and display fields set.
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            description: String::new(),
            test_type: None,
            duration: None,
            adaptive_support: None,
            remote_support: None,
            extra: Map::new(),
        }
    }

    /// Test type codes, empty if absent or malformed.
    pub fn test_type_codes(&self) -> Vec<&str> {
        self.test_type
            .as_ref()
            .map(TestTypes::codes)
            .unwrap_or_default()
    }
}

/// Accept strings, `null` and scalars for free-text fields.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

// ============================================================================
// QUERY
// ============================================================================

/// How much narrative the rich contract asks the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DetailLevel {
    #[serde(rename = "Executive Summary")]
    ExecutiveSummary,
    #[default]
    Standard,
    #[serde(rename = "Deep Dive")]
    DeepDive,
}

impl DetailLevel {
    pub const ALL: [DetailLevel; 3] = [
        DetailLevel::ExecutiveSummary,
        DetailLevel::Standard,
        DetailLevel::DeepDive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::ExecutiveSummary => "Executive Summary",
            DetailLevel::Standard => "Standard",
            DetailLevel::DeepDive => "Deep Dive",
        }
    }
}

/// Default `top_k` when the request omits it.
pub const DEFAULT_TOP_K: usize = 6;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Body of `POST /recommend` and `POST /strategy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub detail_level: DetailLevel,
}

// ============================================================================
// RESULTS
// ============================================================================

/// One ranked item with its squared L2 distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub item: Item,
    /// Position of the item in the corpus.
    pub position: usize,
    pub distance: f32,
}

/// Ranked hits, ascending distance, no repeated `url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
}

impl SearchResult {
    pub fn empty() -> Self {
        Self { hits: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.hits.iter().map(|hit| &hit.item)
    }

    pub fn urls(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.item.url.as_str()).collect()
    }
}
