// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Request routing, independent of the HTTP library.
//!
//! `dispatch` takes a method, a path and a body and returns a status and a
//! JSON value. The server loop does the socket work, and the tests call
//! `dispatch` directly.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error};

use super::AppContext;
use crate::contract::{format_rich, format_strict, rich_candidates};
use crate::search::SearchError;
use crate::types::{RecommendRequest, SearchResult};

/// A JSON response.
///
/// serde_json is built with `preserve_order`, so object keys in `body` keep
/// the order the contract structs declare them in.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
    /// Value of the `Allow` header on 405 replies.
    pub allow: Option<&'static str>,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body,
            allow: None,
        }
    }

    /// Error reply with a `{"detail": ...}` body.
    pub fn detail(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "detail": detail.into() }),
            allow: None,
        }
    }

    fn method_not_allowed(allow: &'static str) -> Self {
        Self {
            allow: Some(allow),
            ..Self::detail(405, "Method Not Allowed")
        }
    }
}

/// Route one request.
pub async fn dispatch(ctx: &Arc<AppContext>, method: &str, url: &str, body: &[u8]) -> Reply {
    let path = url.split(['?', '#']).next().unwrap_or(url);

    match (path, method) {
        ("/health", "GET") => Reply::ok(json!({ "status": "healthy" })),
        ("/health", _) => Reply::method_not_allowed("GET"),
        ("/recommend", "POST") => recommend(ctx, body).await,
        ("/strategy", "POST") => strategy(ctx, body).await,
        ("/recommend" | "/strategy", _) => Reply::method_not_allowed("POST"),
        _ => Reply::detail(404, "Not Found"),
    }
}

async fn recommend(ctx: &Arc<AppContext>, body: &[u8]) -> Reply {
    let request = match parse_request(body) {
        Ok(request) => request,
        Err(reply) => return reply,
    };
    match retrieve(ctx, &request).await {
        Ok(result) => Reply::ok(json!(format_strict(&result))),
        Err(reply) => reply,
    }
}

async fn strategy(ctx: &Arc<AppContext>, body: &[u8]) -> Reply {
    let request = match parse_request(body) {
        Ok(request) => request,
        Err(reply) => return reply,
    };
    let result = match retrieve(ctx, &request).await {
        Ok(result) => result,
        Err(reply) => return reply,
    };

    let candidates = rich_candidates(&result, request.top_k);
    let narrative = ctx
        .synthesizer()
        .synthesize(&request.query, &candidates, request.detail_level)
        .await;

    Reply::ok(json!(format_rich(candidates, narrative)))
}

fn parse_request(body: &[u8]) -> Result<RecommendRequest, Reply> {
    let request: RecommendRequest = serde_json::from_slice(body)
        .map_err(|e| Reply::detail(400, format!("Invalid request body: {e}")))?;

    if request.query.trim().is_empty() {
        return Err(Reply::detail(400, "Empty query"));
    }
    if request.top_k == 0 {
        return Err(Reply::detail(400, "top_k must be a positive integer"));
    }
    Ok(request)
}

/// Run retrieval on the blocking pool.
async fn retrieve(ctx: &Arc<AppContext>, request: &RecommendRequest) -> Result<SearchResult, Reply> {
    let retriever = ctx.retriever().clone();
    let query = request.query.clone();
    let k = request.top_k;

    let outcome = tokio::task::spawn_blocking(move || retriever.search(&query, k)).await;

    match outcome {
        Ok(Ok(result)) => {
            debug!(k, hits = result.len(), "retrieval finished");
            Ok(result)
        }
        Ok(Err(SearchError::EmptyQuery)) => Err(Reply::detail(400, "Empty query")),
        Ok(Err(e)) => {
            error!(error = %e, "retrieval failed");
            Err(Reply::detail(500, "Internal Server Error"))
        }
        Err(e) => {
            error!(error = %e, "retrieval task failed");
            Err(Reply::detail(500, "Internal Server Error"))
        }
    }
}
