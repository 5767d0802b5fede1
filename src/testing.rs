//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides canonical fixtures and fake collaborators (embedders and
//! narrative providers) so tests don't each grow their own.

#![doc(hidden)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::embed::{EmbedError, Embedder};
use crate::narrative::{NarrativeError, NarrativeProvider};
use crate::types::{Item, TestTypes};

// ============================================================================
// ITEMS
// ============================================================================

/// Create a catalog item with a name, test type codes and a short description.
///
/// This is the canonical implementation used across all tests.
pub fn make_item(url: &str, name: &str, types: &[&str]) -> Item {
    let mut item = Item::new(url, name);
    item.description = format!("Assessment: {}", name);
    if !types.is_empty() {
        item.test_type = Some(TestTypes::Many(types.iter().map(|t| t.to_string()).collect()));
    }
    item
}

// ============================================================================
// EMBEDDERS
// ============================================================================

/// Embedder with hand-placed vectors.
///
/// A text gets the vector of the first rule whose needle it contains, or the
/// zero vector. Lets a test put items at exact distances from a query.
#[derive(Debug, Clone)]
pub struct FixedEmbedder {
    dimension: usize,
    rules: Vec<(String, Vec<f32>)>,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rules: Vec::new(),
        }
    }

    pub fn with(mut self, needle: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dimension, "rule vector has wrong dimension");
        self.rules.push((needle.to_string(), vector));
        self
    }
}

impl Embedder for FixedEmbedder {
    fn id(&self) -> &str {
        "fixed"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| vec![0.0; self.dimension]))
    }
}

// ============================================================================
// NARRATIVE PROVIDERS
// ============================================================================

/// Answers every prompt with the same text and remembers the last prompt.
#[derive(Debug, Default)]
pub struct StaticProvider {
    text: String,
    last_prompt: std::sync::Mutex<Option<String>>,
}

impl StaticProvider {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            last_prompt: std::sync::Mutex::new(None),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl NarrativeProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn generate(&self, prompt: &str, _cancel: &CancellationToken) -> Result<String, NarrativeError> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        Ok(self.text.clone())
    }
}

/// Fails every call with the given error.
#[derive(Debug)]
pub struct FailingProvider {
    error: NarrativeError,
}

impl FailingProvider {
    pub fn new(error: NarrativeError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl NarrativeProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str, _cancel: &CancellationToken) -> Result<String, NarrativeError> {
        Err(self.error.clone())
    }
}

/// Never answers. Records whether its cancellation token fired.
#[derive(Debug, Default)]
pub struct HangingProvider {
    cancelled: Arc<AtomicBool>,
}

impl HangingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeProvider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn generate(&self, _prompt: &str, cancel: &CancellationToken) -> Result<String, NarrativeError> {
        // The watcher outlives this future, which is dropped at the deadline
        let token = cancel.clone();
        let flag = Arc::clone(&self.cancelled);
        tokio::spawn(async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });
        std::future::pending().await
    }
}

/// Sleeps for a fixed time per call and tracks peak concurrency.
#[derive(Debug)]
pub struct SlowProvider {
    delay: Duration,
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _prompt: &str, _cancel: &CancellationToken) -> Result<String, NarrativeError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("ok".to_string())
    }
}
