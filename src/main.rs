// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use shortlist::cli::display::*;
use shortlist::cli::{Cli, Commands};
use shortlist::config::{CliOverrides, ServerConfig};
use shortlist::corpus::artifact::{IndexFooter, IndexHeader};
use shortlist::corpus::{build_corpus_with_progress, parse_items, INDEX_FILE, METADATA_FILE};
use shortlist::eval::{self, LabelledQuery, QueryEntry};
use shortlist::narrative::GeminiProvider;
use shortlist::server::{AppContext, HttpServer};
use shortlist::telemetry::{self, Verbosity};
use shortlist::{
    format_strict, ArtifactPaths, Corpus, Embedder, HashEmbedder, Retriever, Synthesizer,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.global.no_color {
        disable_colors();
    }
    let verbosity = cli.global.verbosity();
    telemetry::init_subscriber(verbosity, cli.global.no_color);

    match run(cli.command, verbosity) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, verbosity: Verbosity) -> Result<()> {
    let overrides = command.config_overrides();
    match command {
        Commands::Build { catalog, output } => run_build(&catalog, &output, verbosity),
        Commands::Inspect { file } => inspect_index_file(&file),
        Commands::Search {
            artifacts,
            query,
            limit,
            strict,
        } => run_search(&artifacts, &query, limit, strict),
        Commands::Serve { config, .. } => run_serve(config.as_deref(), &overrides),
        Commands::Evaluate {
            artifacts,
            labels,
            k,
        } => run_evaluate(&artifacts, &labels, k),
        Commands::Submit {
            artifacts,
            queries,
            output,
        } => run_submit(&artifacts, &queries, &output),
    }
}

/// The embedder every artifact is built and queried with.
fn default_embedder() -> Arc<dyn Embedder> {
    Arc::new(HashEmbedder::default_384())
}

fn open_retriever(artifacts: &Path) -> Result<Retriever> {
    let embedder = default_embedder();
    let corpus = Corpus::load(&ArtifactPaths::in_dir(artifacts), embedder.as_ref())
        .with_context(|| format!("failed to load corpus from {}", artifacts.display()))?;
    Ok(Retriever::new(Arc::new(corpus), embedder))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

// ═══════════════════════════════════════════════════════════════════════════
// BUILD
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(feature = "progress")]
fn create_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {prefix:<12} [{bar:40.cyan/dim}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("━━╸"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn run_build(catalog: &Path, output: &Path, verbosity: Verbosity) -> Result<()> {
    let start = Instant::now();

    let json = fs::read_to_string(catalog)
        .with_context(|| format!("failed to read catalog {}", catalog.display()))?;
    let items = parse_items(&json)
        .with_context(|| format!("catalog {} is not a JSON array", catalog.display()))?;
    info!(catalog = %catalog.display(), items = items.len(), "parsed catalog");

    let embedder = HashEmbedder::default_384();

    #[cfg(feature = "progress")]
    let progress = if verbosity == Verbosity::Quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(items.len() as u64);
        bar.set_style(create_progress_style());
        bar.set_prefix("Embedding");
        bar.set_message("items...");
        bar
    };
    #[cfg(feature = "progress")]
    let on_embedded = |_: usize| progress.inc(1);
    #[cfg(not(feature = "progress"))]
    let on_embedded = {
        let _ = verbosity;
        |_: usize| {}
    };

    let corpus = build_corpus_with_progress(items, &embedder, &on_embedded)
        .with_context(|| format!("failed to build corpus from {}", catalog.display()))?;

    #[cfg(feature = "progress")]
    progress.finish_with_message(format!("embedded {} items", corpus.size()));

    let paths = corpus
        .write(output)
        .with_context(|| format!("failed to write artifacts to {}", output.display()))?;

    let index_size = fs::metadata(&paths.index).map(|m| m.len() as usize).unwrap_or(0);
    let metadata_size = fs::metadata(&paths.metadata).map(|m| m.len() as usize).unwrap_or(0);

    println!();
    section_top("BUILD");
    row(&format!("  Items:      {}", paint(Tone::Best, &[BOLD], &corpus.size().to_string())));
    row(&format!("  Embedder:   {}", corpus.embedder_id()));
    row(&format!("  Dimension:  {}", corpus.index().dimension()));
    section_mid("ARTIFACTS");
    row(&format!(
        "  {}  {}",
        pad_right(INDEX_FILE, 16),
        pad_left(&format_size(index_size), 10)
    ));
    row(&format!(
        "  {}  {}",
        pad_right(METADATA_FILE, 16),
        pad_left(&format_size(metadata_size), 10)
    ));
    section_bot();
    println!(
        "  {} in {} ms",
        styled(&[DIM], &output.display().to_string()),
        timing_ms(start.elapsed().as_secs_f64() * 1000.0)
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECT
// ═══════════════════════════════════════════════════════════════════════════

fn inspect_index_file(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let total_size = bytes.len();

    let min_size = IndexHeader::SIZE + IndexFooter::SIZE;
    if total_size < min_size {
        bail!("file too small ({} bytes, minimum {})", total_size, min_size);
    }

    let header = IndexHeader::read(&mut &bytes[..IndexHeader::SIZE])
        .with_context(|| format!("{} is not an index artifact", path.display()))?;
    let offsets = header.section_offsets();

    let footer = IndexFooter::read(&bytes).context("failed to read footer")?;
    // The footer is always the last 8 bytes, whatever the header claims
    let computed_crc = IndexFooter::compute_crc32(&bytes[..total_size - IndexFooter::SIZE]);
    let crc_valid = computed_crc == footer.crc32;
    let layout = header.validate();
    let size_matches = offsets.total_size() == total_size;

    let embedder_id = offsets
        .slice(&bytes, offsets.embedder_id)
        .and_then(|raw| std::str::from_utf8(raw).ok())
        .unwrap_or("<unreadable>");

    println!();
    double_header();
    title("SHORTLIST INDEX");
    double_footer();
    println!();

    section_top("HEADER");
    row(&format!("  File:       {}", path.display()));
    row(&format!("  Size:       {}", format_size(total_size)));
    row(&format!("  Version:    {}", header.version));
    row(&format!("  Items:      {}", header.count));
    row(&format!("  Dimension:  {}", header.dimension));
    row(&format!("  Embedder:   {}", embedder_id));

    section_mid("SECTIONS");
    let sections = [
        ("HEADER", (0, IndexHeader::SIZE)),
        ("EMBEDDER ID", offsets.embedder_id),
        ("FINGERPRINTS", offsets.fingerprints),
        ("VECTORS", offsets.vectors),
        ("FOOTER", offsets.footer),
    ];
    for (name, (start, end)) in sections {
        let size = end.saturating_sub(start);
        let share = if total_size == 0 {
            0.0
        } else {
            size as f64 / total_size as f64 * 100.0
        };
        row(&format!(
            "  {} {} {} {}",
            pad_right(name, 14),
            styled(&[DIM], &format!("@{:>10}", start)),
            pad_left(&format_size(size), 10),
            styled(&[DIM], &format!("{:>5.1}%", share))
        ));
    }

    section_mid("INTEGRITY");
    row(&format!(
        "  {} Layout     {}",
        check_mark(layout.is_ok() && size_matches),
        match (&layout, size_matches) {
            (Err(e), _) => e.to_string(),
            (Ok(()), false) => format!(
                "header describes {} bytes, file has {}",
                offsets.total_size(),
                total_size
            ),
            (Ok(()), true) => "sections agree with header".to_string(),
        }
    ));
    row(&format!(
        "  {} CRC32      stored {:#010x}, computed {}",
        check_mark(crc_valid),
        footer.crc32,
        format!("{:#010x}", computed_crc)
    ));
    section_bot();

    if !crc_valid || layout.is_err() || !size_matches {
        bail!("{} failed integrity checks", path.display());
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// SEARCH
// ═══════════════════════════════════════════════════════════════════════════

fn run_search(artifacts: &Path, query: &str, limit: usize, strict: bool) -> Result<()> {
    let retriever = open_retriever(artifacts)?;

    let start = Instant::now();
    let result = retriever.search(query, limit)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    if strict {
        let json = serde_json::to_string_pretty(&format_strict(&result))?;
        println!("{}", json);
        return Ok(());
    }

    println!();
    section_top(&format!("RESULTS for \"{}\"", truncate_text(query, 50)));
    if result.is_empty() {
        row(&format!("  {}", styled(&[DIM], "no results")));
    }
    for (rank, hit) in result.hits.iter().enumerate() {
        let types = hit.item.test_type_codes().join(",");
        row(&format!(
            "  {} {}  {}  {}",
            pad_left(&(rank + 1).to_string(), 3),
            distance_value(hit.distance),
            pad_right(&truncate_text(&hit.item.name, 52), 52),
            paint(Tone::Accent, &[], &truncate_text(&types, 10))
        ));
        row(&format!(
            "                {}",
            styled(&[DIM], &truncate_text(&hit.item.url, 62))
        ));
    }
    section_bot();
    println!(
        "  {} of {} items in {} ms",
        result.len(),
        retriever.corpus().size(),
        timing_ms(elapsed_ms)
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// SERVE
// ═══════════════════════════════════════════════════════════════════════════

fn run_serve(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let config = ServerConfig::load(config_path, &env, overrides)
        .context("invalid server configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("shortlist-worker")
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(serve(config, env))
}

async fn serve(config: ServerConfig, env: HashMap<String, String>) -> Result<()> {
    let narrative = &config.narrative;
    let synthesizer = match narrative.api_key(&env) {
        Some(key) => {
            let provider = GeminiProvider::resolve(narrative, key)
                .await
                .context("narrative provider unavailable")?;
            info!(model = provider.model(), "narrative provider ready");
            Synthesizer::new(Arc::new(provider), narrative.deadline(), narrative.max_in_flight)
        }
        None => {
            warn!(
                env = %narrative.api_key_env,
                "no API key set, /strategy will answer without a narrative"
            );
            Synthesizer::unconfigured()
        }
    };

    let ctx = Arc::new(AppContext::load(
        &config.artifact_paths(),
        default_embedder(),
        synthesizer,
    ));

    info!(
        items = ctx.retriever().corpus().size(),
        narrative = ctx.synthesizer().provider_name(),
        "corpus ready"
    );

    let server = HttpServer::bind(&config.bind)
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            return;
        }
        info!("shutting down");
        on_signal.cancel();
    });

    server.run(ctx, shutdown).await.context("server stopped with an error")
}

// ═══════════════════════════════════════════════════════════════════════════
// EVALUATE / SUBMIT
// ═══════════════════════════════════════════════════════════════════════════

fn run_evaluate(artifacts: &Path, labels: &Path, k: usize) -> Result<()> {
    let labelled: Vec<LabelledQuery> = read_json(labels)?;
    let retriever = open_retriever(artifacts)?;
    let report = eval::evaluate(&retriever, &labelled, k)?;

    println!();
    section_top(&format!("RECALL@{}", report.k));
    for outcome in &report.outcomes {
        row(&format!(
            "  {}  {}",
            outcome_badge(outcome.hit),
            truncate_text(&outcome.query, 70)
        ));
    }
    section_mid("SUMMARY");
    row(&format!(
        "  Mean Recall@{}: {}  ({}/{} queries)",
        report.k,
        recall_value(report.mean_recall()),
        report.hits(),
        report.outcomes.len()
    ));
    section_bot();
    Ok(())
}

fn run_submit(artifacts: &Path, queries: &Path, output: &Path) -> Result<()> {
    let entries: Vec<QueryEntry> = read_json(queries)?;
    let retriever = open_retriever(artifacts)?;
    let rows = eval::submission_rows(&retriever, &entries)?;

    eval::write_submission(output, &rows)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(queries = entries.len(), rows = rows.len(), "wrote submission");

    println!(
        "{} {} rows for {} queries → {}",
        check_mark(true),
        rows.len(),
        entries.len(),
        output.display()
    );
    Ok(())
}
