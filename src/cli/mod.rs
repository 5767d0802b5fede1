// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the shortlist command-line interface.
//!
//! Six subcommands. `build` turns a raw catalog into the two corpus artifacts,
//! `inspect` examines an `.slx` file, `search` queries a corpus locally, and
//! `serve` puts it behind HTTP. `evaluate` and `submit` run a query set in
//! batch: one scores Recall@k against labels, the other exports a CSV.

pub mod display;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::CliOverrides;
use crate::eval::DEFAULT_RECALL_K;
use crate::telemetry::Verbosity;
use crate::types::DEFAULT_TOP_K;

#[derive(Parser)]
#[command(
    name = "shortlist",
    about = "Exact vector retrieval over an assessment catalog",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Log debug output from shortlist
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also honors NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl GlobalArgs {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Embed a raw catalog and write index.slx + metadata.json
    Build {
        /// Raw catalog JSON (an array of item records)
        #[arg(short, long, default_value = "products.json")]
        catalog: PathBuf,

        /// Output directory for the corpus artifacts
        #[arg(short, long, default_value = "artifacts")]
        output: PathBuf,
    },

    /// Inspect an .slx index file structure
    Inspect {
        /// Path to .slx file
        file: PathBuf,
    },

    /// Search a corpus and display results
    Search {
        /// Directory holding index.slx and metadata.json
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Free-text job or role query
        query: String,

        /// Maximum number of results to return
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        limit: usize,

        /// Print the strict JSON contract instead of a table
        #[arg(long)]
        strict: bool,
    },

    /// Serve /health, /recommend and /strategy over HTTP
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overrides config and SHORTLIST_BIND
        #[arg(short, long)]
        bind: Option<String>,

        /// Artifacts directory, overrides config and SHORTLIST_ARTIFACTS
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Score mean Recall@k over labelled queries
    ///
    /// The labels file is a JSON array of `{"query": ..., "relevant_urls": [...]}`.
    /// A query counts as a hit when any retrieved url shares its last path
    /// segment with a relevant url.
    Evaluate {
        /// Directory holding index.slx and metadata.json
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Labelled queries JSON
        #[arg(short, long)]
        labels: PathBuf,

        /// Cutoff for Recall@k
        #[arg(short, long, default_value_t = DEFAULT_RECALL_K)]
        k: usize,
    },

    /// Write a Query,Assessment_url submission CSV
    Submit {
        /// Directory holding index.slx and metadata.json
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Queries JSON: an array of strings or `{"query": ...}` objects
        #[arg(long)]
        queries: PathBuf,

        /// Output CSV path
        #[arg(short, long, default_value = "submission.csv")]
        output: PathBuf,
    },
}

impl Commands {
    /// Overrides for `serve`; empty for every other command.
    pub fn config_overrides(&self) -> CliOverrides {
        match self {
            Commands::Serve { bind, artifacts, .. } => CliOverrides {
                bind: bind.clone(),
                artifacts: artifacts.clone(),
            },
            _ => CliOverrides::default(),
        }
    }
}
