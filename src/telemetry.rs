// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Log subscriber setup for the `shortlist` binary.
//!
//! Logs go to stderr, so `shortlist search --strict` output on stdout stays
//! pipeable.
//!
//! # Filter priority (highest to lowest)
//!
//! 1. `SHORTLIST_LOG` (per-target directives, e.g. `shortlist=debug,warn`)
//! 2. `RUST_LOG`
//! 3. CLI flags: `-q` errors only, default `shortlist=info,warn`, `-v` debug

use std::io::IsTerminal;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Project-specific filter variable.
pub const LOG_ENV: &str = "SHORTLIST_LOG";

const CRATE_TARGET: &str = "shortlist";

/// Verbosity derived from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Map `-v`/`-q` to a level. The CLI rejects the two together, so at most
    /// one flag is set.
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Filter directive used when neither env variable is set.
    pub fn default_directive(self) -> String {
        match self {
            Self::Quiet => "error".to_string(),
            Self::Normal => format!("warn,{CRATE_TARGET}=info"),
            Self::Verbose => format!("info,{CRATE_TARGET}=debug"),
        }
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_subscriber(verbosity: Verbosity, no_color: bool) {
    let filter = build_env_filter(verbosity, std::env::var(LOG_ENV).ok());
    let use_ansi = !no_color && std::io::stderr().is_terminal();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(verbosity == Verbosity::Verbose);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer.compact())
        .try_init();
}

/// `SHORTLIST_LOG` > `RUST_LOG` > CLI default. Unparsable values fall through.
fn build_env_filter(verbosity: Verbosity, project_directives: Option<String>) -> EnvFilter {
    if let Some(filter) = project_directives.and_then(|d| EnvFilter::try_new(d).ok()) {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(verbosity.default_directive()).unwrap_or_else(|_| EnvFilter::new("warn"))
}
