// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Exact vector retrieval over an assessment catalog.
//!
//! A free-text job or role query goes in, a ranked, bounded list of catalog
//! items comes out. The same ranked list is shaped two ways: a strict contract
//! for automated consumers and a rich contract that carries a narrative
//! hiring strategy written by an external text-generation provider.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  corpus/    │────▶│  index/      │────▶│  search/     │────▶│  contract/   │
//! │ (build,     │     │ (exact L2,   │     │ (embed, k-NN,│     │ (strict,     │
//! │  artifact)  │     │  top-k)      │     │  url dedup)  │     │  rich)       │
//! └─────────────┘     └──────────────┘     └──────────────┘     └──────────────┘
//!        ▲                                        │                    │
//!        │                                        ▼                    ▼
//! ┌─────────────┐                         ┌──────────────┐     ┌──────────────┐
//! │  embed/     │────────────────────────▶│  server/     │◀────│  narrative/  │
//! │ (Embedder)  │                         │ (/recommend, │     │ (deadline,   │
//! └─────────────┘                         │  /strategy)  │     │  provider)   │
//!                                         └──────────────┘     └──────────────┘
//! ```
//!
//! The corpus and its index are built offline (`shortlist build`), loaded once
//! at startup into an [`AppContext`](server::AppContext), and never mutated.
//! Every request reads them without locking.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use shortlist::{build_corpus, format_strict, HashEmbedder, Retriever};
//!
//! let embedder = Arc::new(HashEmbedder::default_384());
//! let corpus = build_corpus(items, embedder.as_ref())?;
//! let retriever = Retriever::new(Arc::new(corpus), embedder);
//!
//! let result = retriever.search("java developer", 5)?;
//! let strict = format_strict(&result);
//! ```

pub mod cli;
pub mod config;
pub mod contract;
pub mod corpus;
pub mod embed;
pub mod eval;
pub mod index;
pub mod narrative;
pub mod search;
pub mod server;
pub mod telemetry;
pub mod types;
mod util;

#[doc(hidden)]
pub mod testing;

pub use config::{ConfigError, NarrativeSettings, ServerConfig};
pub use contract::{
    format_rich, format_strict, rich_candidates, RichResponse, StrictAssessment, StrictResponse,
};
pub use corpus::{build_corpus, ArtifactPaths, Corpus, CorpusError};
pub use embed::{EmbedError, Embedder, HashEmbedder};
pub use index::{DimensionMismatch, Neighbor, VectorIndex};
pub use narrative::{NarrativeError, NarrativeProvider, Synthesizer, TIMEOUT_SENTINEL};
pub use search::{Retriever, SearchError};
pub use types::{DetailLevel, Flag, Item, Minutes, RecommendRequest, SearchHit, SearchResult, TestTypes};
pub use util::url_fingerprint;
