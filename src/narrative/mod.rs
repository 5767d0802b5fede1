// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Narrative synthesis: a hiring strategy written about the ranked candidates.
//!
//! The provider is slow, sometimes down, sometimes refuses. None of that is
//! allowed to reach the caller as an error. [`Synthesizer::synthesize`]
//! always returns text: either the narrative, or one of the sentinel strings
//! below. The rich contract ships the raw results regardless.
//!
//! # Outcomes
//!
//! | Outcome              | Text                                                       |
//! |----------------------|------------------------------------------------------------|
//! | success              | provider text                                              |
//! | deadline expired     | [`TIMEOUT_SENTINEL`]                                       |
//! | safety block         | `⚠️ Response blocked by AI safety filters. Reason: {r}`    |
//! | provider error       | `⚠️ Narrative provider error: {detail}`                    |
//! | no provider          | [`NOT_CONFIGURED_SENTINEL`]                                |

pub mod gemini;
mod prompt;
mod synthesizer;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use gemini::GeminiProvider;
pub use prompt::{build_prompt, detail_instruction};
pub use synthesizer::Synthesizer;

/// Text returned when the deadline expires before the provider answers.
pub const TIMEOUT_SENTINEL: &str = "⚠️ Analysis timed out.";

/// Text returned when no provider is configured.
pub const NOT_CONFIGURED_SENTINEL: &str = "⚠️ Narrative synthesis is not configured.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("response blocked: {reason}")]
    Blocked { reason: String },

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("narrative provider is not configured")]
    NotConfigured,

    #[error("none of the configured models is available: {}", candidates.join(", "))]
    NoModelAvailable { candidates: Vec<String> },
}

impl NarrativeError {
    /// The user-facing text for this failure.
    pub fn sentinel(&self) -> String {
        match self {
            NarrativeError::Timeout(_) | NarrativeError::Cancelled => TIMEOUT_SENTINEL.to_string(),
            NarrativeError::Blocked { reason } => {
                format!("⚠️ Response blocked by AI safety filters. Reason: {reason}")
            }
            NarrativeError::NotConfigured => NOT_CONFIGURED_SENTINEL.to_string(),
            NarrativeError::Provider(detail) => format!("⚠️ Narrative provider error: {detail}"),
            NarrativeError::NoModelAvailable { .. } => {
                format!("⚠️ Narrative provider error: {self}")
            }
        }
    }
}

/// An opaque text-generation call.
///
/// Implementations should stop work promptly once `cancel` fires. The
/// synthesizer also drops the future at the deadline, so a provider that
/// ignores the token is still cut off at its next await point.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, cancel: &CancellationToken)
        -> Result<String, NarrativeError>;
}

/// Provider used when no API key is present. Always `NotConfigured`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

#[async_trait]
impl NarrativeProvider for Unconfigured {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, NarrativeError> {
        Err(NarrativeError::NotConfigured)
    }
}
