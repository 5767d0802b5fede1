// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Offline evaluation and submission export.
//!
//! Labelled queries come from a JSON file:
//!
//! ```json
//! [{"query": "Java developer, 40 minutes", "relevant_urls": ["https://.../view/java-8-new/"]}]
//! ```
//!
//! Urls are compared by slug (the last non-empty path segment), because the
//! same product shows up under several url prefixes. A query scores 1 if any
//! retrieved slug matches any relevant slug, else 0. Mean over all queries is
//! the reported Recall@k.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::contract::format_strict;
use crate::search::{Retriever, SearchError};
use crate::util::write_atomic;

/// Default cutoff for `shortlist evaluate`.
pub const DEFAULT_RECALL_K: usize = 10;

/// Results requested per query for a submission (the strict contract caps it anyway).
pub const SUBMISSION_K: usize = 10;

/// Header row of the submission CSV.
pub const SUBMISSION_HEADER: [&str; 2] = ["Query", "Assessment_url"];

/// One query with its ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelledQuery {
    pub query: String,
    #[serde(default)]
    pub relevant_urls: Vec<String>,
}

/// An unlabelled query, as a bare string or an object with a `query` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum QueryEntry {
    Text(String),
    Object { query: String },
}

impl QueryEntry {
    pub fn text(&self) -> &str {
        match self {
            QueryEntry::Text(q) | QueryEntry::Object { query: q } => q,
        }
    }
}

/// Last non-empty path segment: `.../view/java-8-new/` → `java-8-new`.
pub fn url_slug(url: &str) -> &str {
    url.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
}

/// Whether any retrieved slug is relevant. A query without labels never hits.
pub fn recall_hit<'a>(retrieved: impl IntoIterator<Item = &'a str>, relevant: &[String]) -> bool {
    if relevant.is_empty() {
        return false;
    }
    let relevant: Vec<&str> = relevant.iter().map(|u| url_slug(u)).collect();
    retrieved
        .into_iter()
        .map(url_slug)
        .any(|slug| !slug.is_empty() && relevant.contains(&slug))
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub query: String,
    pub hit: bool,
    pub retrieved: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    pub k: usize,
    pub outcomes: Vec<QueryOutcome>,
}

impl EvalReport {
    /// Mean Recall@k over every query, 0.0 for an empty set.
    pub fn mean_recall(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let hits = self.outcomes.iter().filter(|o| o.hit).count();
        hits as f64 / self.outcomes.len() as f64
    }

    pub fn hits(&self) -> usize {
        self.outcomes.iter().filter(|o| o.hit).count()
    }
}

/// Run every labelled query and score it. Blank queries score 0.
pub fn evaluate(
    retriever: &Retriever,
    labelled: &[LabelledQuery],
    k: usize,
) -> Result<EvalReport, SearchError> {
    let mut outcomes = Vec::with_capacity(labelled.len());

    for entry in labelled {
        let retrieved: Vec<String> = match retriever.search(&entry.query, k) {
            Ok(result) => result.urls().into_iter().map(str::to_owned).collect(),
            Err(SearchError::EmptyQuery) => Vec::new(),
            Err(e) => return Err(e),
        };
        let hit = recall_hit(retrieved.iter().map(String::as_str), &entry.relevant_urls);
        debug!(query = %entry.query, hit, "evaluated");
        outcomes.push(QueryOutcome {
            query: entry.query.clone(),
            hit,
            retrieved,
        });
    }

    Ok(EvalReport { k, outcomes })
}

/// `(query, url)` rows: one per strict recommendation, or one with an empty
/// url when a query has no results.
pub fn submission_rows(
    retriever: &Retriever,
    queries: &[QueryEntry],
) -> Result<Vec<(String, String)>, SearchError> {
    let mut rows = Vec::new();
    for entry in queries {
        let query = entry.text();
        let strict = match retriever.search(query, SUBMISSION_K) {
            Ok(result) => format_strict(&result),
            Err(SearchError::EmptyQuery) => Default::default(),
            Err(e) => return Err(e),
        };

        if strict.recommended_assessments.is_empty() {
            rows.push((query.to_string(), String::new()));
        } else {
            rows.extend(
                strict
                    .recommended_assessments
                    .into_iter()
                    .map(|a| (query.to_string(), a.url)),
            );
        }
    }
    Ok(rows)
}

/// Render rows as CSV with the submission header.
pub fn submission_csv(rows: &[(String, String)]) -> String {
    let mut out = format!("{},{}\r\n", SUBMISSION_HEADER[0], SUBMISSION_HEADER[1]);
    for (query, url) in rows {
        out.push_str(&csv_field(query));
        out.push(',');
        out.push_str(&csv_field(url));
        out.push_str("\r\n");
    }
    out
}

pub fn write_submission(path: &Path, rows: &[(String, String)]) -> std::io::Result<()> {
    write_atomic(path, submission_csv(rows).as_bytes())
}

/// Quote a field if it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
