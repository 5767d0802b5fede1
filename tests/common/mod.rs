//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use shortlist::corpus::parse_items;
use shortlist::testing::FixedEmbedder;
use shortlist::{build_corpus, ArtifactPaths, Corpus, Embedder, HashEmbedder, Item, Retriever};

// Re-export canonical test utilities from shortlist::testing
pub use shortlist::testing::make_item;

// ============================================================================
// SAMPLE CATALOG
// ============================================================================

/// A small catalog in the shape the collector produces, sloppy fields included.
pub const SAMPLE_CATALOG: &str = r#"[
  {
    "url": "https://www.shl.com/solutions/products/product-catalog/view/core-java-entry-level-new/",
    "name": "Core Java (Entry Level) (New)",
    "description": "Multi-choice test that measures knowledge of basic Java constructs, OOP concepts, file handling and exceptions.",
    "test_type": ["K"],
    "duration": 13,
    "adaptive_support": "No",
    "remote_support": "Yes"
  },
  {
    "url": "https://www.shl.com/solutions/products/product-catalog/view/java-8-new/",
    "name": "Java 8 (New)",
    "description": "Measures knowledge of Java class design, exceptions, generics, collections and streams.",
    "test_type": "K",
    "duration": "18",
    "adaptive_support": "Yes",
    "remote_support": "Yes"
  },
  {
    "url": "https://www.shl.com/solutions/products/product-catalog/view/python-new/",
    "name": "Python (New)",
    "description": "Multi-choice test of Python programming, data structures, modules and exception handling.",
    "test_type": ["K"],
    "duration": 11,
    "remote_support": "Yes"
  },
  {
    "url": "https://www.shl.com/solutions/products/product-catalog/view/sql-server-new/",
    "name": "SQL Server (New)",
    "description": "Measures knowledge of SQL queries, joins, stored procedures and database administration.",
    "test_type": ["K"],
    "duration": 10.5
  },
  {
    "url": "https://www.shl.com/solutions/products/product-catalog/view/occupational-personality-questionnaire-opq32r/",
    "name": "Occupational Personality Questionnaire OPQ32r",
    "description": "Personality questionnaire describing behavioural style at work: relationships with people, thinking style, feelings and emotions.",
    "test_type": ["P"],
    "duration": 25,
    "adaptive_support": "No",
    "remote_support": "Yes"
  },
  {
    "url": "https://www.shl.com/solutions/products/product-catalog/view/verify-numerical-ability/",
    "name": "Verify - Numerical Ability",
    "description": "Adaptive test of numerical reasoning: interpreting tables and charts, percentages and ratios.",
    "test_type": ["A"],
    "duration": "untimed",
    "adaptive_support": true,
    "remote_support": true
  },
  {
    "url": "https://www.shl.com/solutions/products/product-catalog/view/sales-representative-solution/",
    "name": "Sales Representative Solution",
    "description": "Pre-packaged solution for sales representatives: customer focus, persuasion, resilience and numerical reasoning.",
    "test_type": ["A", "B", "P"],
    "duration": null
  },
  {
    "url": "https://www.shl.com/solutions/products/product-catalog/view/business-communication-adaptive/",
    "name": "Business Communication (adaptive)",
    "description": "Adaptive test of written English for business communication: grammar, vocabulary and comprehension.",
    "test_type": ["K"],
    "duration": 7,
    "adaptive_support": "Yes"
  }
]"#;

/// Number of records in [`SAMPLE_CATALOG`].
pub const SAMPLE_SIZE: usize = 8;

pub fn sample_items() -> Vec<Item> {
    parse_items(SAMPLE_CATALOG).expect("sample catalog parses")
}

// ============================================================================
// RETRIEVERS
// ============================================================================

pub fn hash_embedder() -> Arc<dyn Embedder> {
    Arc::new(HashEmbedder::default_384())
}

/// Retriever over `items` with the default hash embedder.
pub fn hash_retriever(items: Vec<Item>) -> Retriever {
    let embedder = hash_embedder();
    let corpus = build_corpus(items, embedder.as_ref()).expect("corpus builds");
    Retriever::new(Arc::new(corpus), embedder)
}

pub fn sample_retriever() -> Retriever {
    hash_retriever(sample_items())
}

/// Retriever over an empty corpus.
pub fn empty_retriever() -> Retriever {
    Retriever::new(Arc::new(Corpus::empty()), hash_embedder())
}

/// Text that the placed embedder maps to the query point.
pub const QUERY: &str = "QUERYPOINT";

/// Retriever whose items sit at hand-picked 2-d points.
///
/// Each entry is `(url, name, point)`. Names must not contain one another,
/// because the embedder picks the first rule whose needle appears in the
/// item's text. Searching for [`QUERY`] embeds to `query_at`.
pub fn placed_retriever(placed: &[(&str, &str, [f32; 2])], query_at: [f32; 2]) -> Retriever {
    let mut embedder = FixedEmbedder::new(2).with(QUERY, query_at.to_vec());
    let mut items = Vec::with_capacity(placed.len());
    for &(url, name, point) in placed {
        embedder = embedder.with(name, point.to_vec());
        items.push(make_item(url, name, &["K"]));
    }
    let embedder: Arc<dyn Embedder> = Arc::new(embedder);
    let corpus = build_corpus(items, embedder.as_ref()).expect("corpus builds");
    Retriever::new(Arc::new(corpus), embedder)
}

// ============================================================================
// ARTIFACTS
// ============================================================================

/// Build the sample catalog into `dir` with the hash embedder.
pub fn write_sample_artifacts(dir: &Path) -> ArtifactPaths {
    let corpus = build_corpus(sample_items(), hash_embedder().as_ref()).expect("corpus builds");
    corpus.write(dir).expect("artifacts written")
}
