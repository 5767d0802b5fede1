// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The HTTP surface: `/health`, `/recommend`, `/strategy`.
//!
//! tiny_http is blocking, so it gets its own OS thread. That thread only
//! accepts: every request goes over a bounded channel into the tokio runtime,
//! where it gets its own task. Body reads and responses happen on the
//! blocking pool. Retrieval is CPU work and also runs there. The narrative
//! call is the one slow await, and it is bounded by its deadline.
//!
//! ```text
//! accept thread ──mpsc──▶ select! loop ──spawn──▶ handle() ──▶ routes::dispatch()
//! ```
//!
//! Shared state is one `Arc<AppContext>`, built before the first request and
//! never mutated.
//!
//! Shutdown stops the accept thread first, then waits for every request it
//! already handed over to be answered.

pub mod routes;

use std::io::{self, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tiny_http::{Header, Request, Response, Server};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::corpus::{ArtifactPaths, Corpus};
use crate::embed::Embedder;
use crate::narrative::Synthesizer;
use crate::search::Retriever;
use routes::Reply;

pub use routes::dispatch;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Requests waiting between the accept thread and the runtime.
const REQUEST_QUEUE: usize = 64;

// ============================================================================
// APPLICATION CONTEXT
// ============================================================================

/// Everything a handler reads. Built once at startup.
#[derive(Debug, Clone)]
pub struct AppContext {
    retriever: Retriever,
    synthesizer: Synthesizer,
}

impl AppContext {
    pub fn new(retriever: Retriever, synthesizer: Synthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }

    /// Load the corpus, or serve from an empty one if it can't be loaded.
    ///
    /// A missing or corrupt corpus is logged at error level. The server still
    /// starts: `/health` answers and searches return empty lists.
    pub fn load(paths: &ArtifactPaths, embedder: Arc<dyn Embedder>, synthesizer: Synthesizer) -> Self {
        let corpus = match Corpus::load(paths, embedder.as_ref()) {
            Ok(corpus) => corpus,
            Err(e) => {
                error!(error = %e, "corpus unavailable, serving empty results");
                Corpus::empty()
            }
        };
        Self::new(Retriever::new(Arc::new(corpus), embedder), synthesizer)
    }

    /// Empty corpus, hash embedder, no narrative provider.
    pub fn empty() -> Self {
        Self::new(
            Retriever::new(
                Arc::new(Corpus::empty()),
                Arc::new(crate::embed::HashEmbedder::default_384()),
            ),
            Synthesizer::unconfigured(),
        )
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }
}

// ============================================================================
// SERVER
// ============================================================================

/// A bound, not yet running, HTTP server.
pub struct HttpServer {
    server: Arc<Server>,
}

impl HttpServer {
    pub fn bind(addr: &str) -> io::Result<Self> {
        let server = Server::http(addr).map_err(|e| io::Error::other(format!("cannot bind {addr}: {e}")))?;
        Ok(Self {
            server: Arc::new(server),
        })
    }

    /// The actual address, useful after binding port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, ctx: Arc<AppContext>, shutdown: CancellationToken) -> io::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Request>(REQUEST_QUEUE);

        let accept = Arc::clone(&self.server);
        let accept_thread = thread::Builder::new()
            .name("shortlist-accept".to_string())
            .spawn(move || {
                while let Ok(request) = accept.recv() {
                    if tx.blocking_send(request).is_err() {
                        break;
                    }
                }
            })?;

        if let Some(addr) = self.local_addr() {
            info!(%addr, "listening");
        }

        let tasks = TaskTracker::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                maybe_request = rx.recv() => {
                    let Some(request) = maybe_request else { break };
                    tasks.spawn(handle(Arc::clone(&ctx), request));
                }
            }
        }

        info!("shutting down");
        self.server.unblock();
        rx.close();
        if accept_thread.join().is_err() {
            warn!("accept thread panicked");
        }

        // Requests already accepted still get an answer.
        while let Some(request) = rx.recv().await {
            tasks.spawn(handle(Arc::clone(&ctx), request));
        }
        tasks.close();
        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "draining");
        }
        tasks.wait().await;
        Ok(())
    }
}

enum Body {
    Read(Vec<u8>),
    TooLarge,
    Failed(io::Error),
}

fn read_body(request: &mut Request) -> Body {
    if request.body_length().is_some_and(|len| len > MAX_BODY_BYTES) {
        return Body::TooLarge;
    }
    let mut buf = Vec::new();
    match request
        .as_reader()
        .take(MAX_BODY_BYTES as u64 + 1)
        .read_to_end(&mut buf)
    {
        Ok(_) if buf.len() > MAX_BODY_BYTES => Body::TooLarge,
        Ok(_) => Body::Read(buf),
        Err(e) => Body::Failed(e),
    }
}

async fn handle(ctx: Arc<AppContext>, mut request: Request) {
    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();

    let read = tokio::task::spawn_blocking(move || {
        let body = read_body(&mut request);
        (request, body)
    })
    .await;
    let Ok((request, body)) = read else {
        error!(%method, %url, "request body read panicked");
        return;
    };

    let reply = match body {
        Body::Read(bytes) => dispatch(&ctx, &method, &url, &bytes).await,
        Body::TooLarge => Reply::detail(413, format!("Request body exceeds {MAX_BODY_BYTES} bytes")),
        Body::Failed(e) => Reply::detail(400, format!("Cannot read request body: {e}")),
    };

    debug!(
        %method,
        %url,
        status = reply.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    let response = to_response(&reply);
    let sent = tokio::task::spawn_blocking(move || request.respond(response)).await;
    if let Ok(Err(e)) = sent {
        debug!(error = %e, "client went away before response");
    }
}

fn to_response(reply: &Reply) -> Response<io::Cursor<Vec<u8>>> {
    let bytes = serde_json::to_vec(&reply.body).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::from_data(bytes).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(header);
    }
    if let Some(allow) = reply.allow {
        if let Ok(header) = Header::from_bytes(&b"Allow"[..], allow.as_bytes()) {
            response.add_header(header);
        }
    }
    response
}
