// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Deadline-bounded narrative synthesis.
//!
//! One `tokio::time::timeout` wraps both the wait for a permit and the
//! provider call, so a request never waits longer than the deadline in total,
//! however many others are queued ahead of it. When the deadline fires the
//! provider's token is cancelled and its future is dropped in the same step.
//! Exactly one outcome comes back.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{build_prompt, NarrativeError, NarrativeProvider, Unconfigured};
use crate::types::{DetailLevel, Item};

/// Default hard deadline per synthesis.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Default bound on concurrent provider calls.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

#[derive(Clone)]
pub struct Synthesizer {
    provider: Arc<dyn NarrativeProvider>,
    deadline: Duration,
    permits: Arc<Semaphore>,
}

impl Synthesizer {
    /// `max_in_flight` of zero is treated as one.
    pub fn new(provider: Arc<dyn NarrativeProvider>, deadline: Duration, max_in_flight: usize) -> Self {
        Self {
            provider,
            deadline,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Synthesizer that always answers with the "not configured" sentinel.
    pub fn unconfigured() -> Self {
        Self::new(Arc::new(Unconfigured), DEFAULT_DEADLINE, DEFAULT_MAX_IN_FLIGHT)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Narrative for `candidates`, or a sentinel. Never fails, never exceeds the deadline.
    pub async fn synthesize(&self, query: &str, candidates: &[Item], level: DetailLevel) -> String {
        let prompt = build_prompt(query, candidates, level);
        match self.run(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "narrative synthesis failed");
                e.sentinel()
            }
        }
    }

    /// One bounded provider call.
    pub async fn run(&self, prompt: &str) -> Result<String, NarrativeError> {
        let cancel = CancellationToken::new();
        // Fires if this future is dropped mid-call (client went away)
        let guard = cancel.clone().drop_guard();

        let work = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| NarrativeError::Cancelled)?;
            self.provider.generate(prompt, &cancel).await
        };

        match tokio::time::timeout(self.deadline, work).await {
            Ok(result) => {
                let _ = guard.disarm();
                debug!(provider = self.provider.name(), ok = result.is_ok(), "narrative call finished");
                result
            }
            Err(_) => {
                // The guard cancels the token as it drops here
                drop(guard);
                Err(NarrativeError::Timeout(self.deadline))
            }
        }
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("provider", &self.provider.name())
            .field("deadline", &self.deadline)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}
