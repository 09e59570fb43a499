//! CLI binary for scanslate.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `EngineConfig`, renders a live progress bar, and writes one plain-text
//! artifact per page.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use scanslate::{
    cancel_pair, run_batch, ArtifactSink, BatchProgress, EngineConfig, PageArtifact, PageRange,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI arguments ─────────────────────────────────────────────────────────────

/// Translate scanned page images into bilingual tables via a vision LLM.
#[derive(Parser, Debug)]
#[command(name = "scanslate", version, about)]
struct Args {
    /// Directory of page images named `prefix-<number>.<ext>`.
    source_dir: PathBuf,

    /// First page to translate (1-indexed, inclusive).
    #[arg(long, default_value_t = 1)]
    start: u32,

    /// Last page to translate (inclusive). Defaults to the highest page
    /// number found in the source directory.
    #[arg(long)]
    end: Option<u32>,

    /// Directory to write per-page `.txt` artifacts into. When omitted,
    /// outcomes are only summarised on stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// API key. Falls back to the GEMINI_API_KEY environment variable.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier.
    #[arg(long, default_value = scanslate::DEFAULT_MODEL)]
    model: String,

    /// Endpoint base URL (for compatible gateways).
    #[arg(long, default_value = scanslate::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Target language for the translation.
    #[arg(long, default_value = scanslate::DEFAULT_TARGET_LANG)]
    target_lang: String,

    /// Content-quality attempts per page.
    #[arg(long, default_value_t = 4)]
    page_attempts: u32,

    /// Physical calls per content attempt.
    #[arg(long, default_value_t = 6)]
    transport_attempts: u32,

    /// Seconds to pause between pages.
    #[arg(long, default_value_t = 2)]
    inter_page_delay: u64,

    /// Per-call timeout in seconds.
    #[arg(long, default_value_t = 300)]
    call_timeout: u64,

    /// Verbose logging (repeat for more: -v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Progress bar callback ─────────────────────────────────────────────────────

struct CliProgress {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl BatchProgress for CliProgress {
    fn on_batch_start(&self, selected_pages: usize, total_pages: u32) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        self.bar.set_length(selected_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Translating");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Translating {selected_pages} of {total_pages} page(s)…"
            ))
        ));
    }

    fn on_page_start(&self, page_number: u32, _selected: usize) {
        self.bar.set_message(format!("page {page_number}"));
    }

    fn on_page_done(&self, page_number: u32, fraction: f64, accepted: bool) {
        if accepted {
            self.bar.println(format!(
                "  {} Page {:>3}  {}",
                green("✓"),
                page_number,
                dim(&format!("{:.0}%", fraction * 100.0))
            ));
        } else {
            self.errors.fetch_add(1, Ordering::SeqCst);
            self.bar.println(format!(
                "  {} Page {:>3}  {}",
                red("✗"),
                page_number,
                red("failed")
            ));
        }
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, selected_pages: usize, accepted: usize) {
        self.bar.finish_and_clear();
        let failed = selected_pages.saturating_sub(accepted);
        if failed == 0 {
            eprintln!("{} all {selected_pages} page(s) translated", green("done:"));
        } else {
            eprintln!(
                "{} {accepted} translated, {failed} failed (failure artifacts written)",
                red("done with failures:")
            );
        }
    }
}

// ── File-writing artifact sink ────────────────────────────────────────────────

/// Writes one `page-NNN.txt` per outcome. Failure pages carry the reason and
/// source file name in the body, so a human can re-run just that page.
struct FileSink {
    dir: PathBuf,
}

impl ArtifactSink for FileSink {
    fn page_ready(&self, artifact: &PageArtifact) {
        let path = self.dir.join(format!("page-{:03}.txt", artifact.page_number));
        let body = artifact.outcome.artifact_body(&artifact.source_file);
        if let Err(e) = std::fs::write(&path, body) {
            eprintln!("{} writing {}: {e}", red("error"), path.display());
        }
    }

    fn batch_ready(&self, total_pages: u32) {
        let path = self.dir.join("index.txt");
        let body = format!("document pages: {total_pages}\n");
        if let Err(e) = std::fs::write(&path, body) {
            eprintln!("{} writing {}: {e}", red("error"), path.display());
        }
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("scanslate={default_level}"))),
        )
        .with_writer(std::io::stderr)
        .init();

    // Open-ended --end means "through the last page on disk".
    let end = args.end.unwrap_or(u32::MAX);
    let range = PageRange::new(args.start, end);

    let progress = CliProgress::new();
    let (cancel_handle, cancel_token) = cancel_pair();

    let mut builder = EngineConfig::builder()
        .model(&args.model)
        .endpoint(&args.endpoint)
        .target_lang(&args.target_lang)
        .page_attempts(args.page_attempts)
        .transport_attempts(args.transport_attempts)
        .inter_page_delay(Duration::from_secs(args.inter_page_delay))
        .call_timeout(Duration::from_secs(args.call_timeout))
        .progress(progress.clone())
        .cancel(cancel_token);

    if let Some(key) = &args.api_key {
        builder = builder.api_key(key);
    }

    if let Some(out) = &args.out {
        std::fs::create_dir_all(out)
            .with_context(|| format!("creating output directory {}", out.display()))?;
        builder = builder.sink(Arc::new(FileSink { dir: out.clone() }));
    }

    let config = builder.build().context("invalid configuration")?;

    // First Ctrl-C cancels gracefully after the current wait/page.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{} finishing current page, then stopping…", dim("interrupted:"));
            cancel_handle.cancel();
        }
    });

    let report = run_batch(&args.source_dir, range, &config)
        .await
        .context("translation batch failed")?;

    for page in &report.reports {
        if let Some(reason) = page.outcome.failure_reason() {
            eprintln!(
                "  {} page {} ({}): {reason}",
                red("✗"),
                page.page_number,
                page.source_file
            );
        }
    }

    if report.cancelled {
        eprintln!(
            "{} {} of {} page(s) processed before cancellation",
            dim("note:"),
            report.reports.len(),
            report.selected_pages
        );
    }

    if report.accepted == 0 {
        anyhow::bail!("no page produced an accepted translation");
    }
    Ok(())
}
