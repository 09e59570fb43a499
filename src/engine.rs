//! Batch orchestration: one terminal outcome per selected page.
//!
//! Pages are processed **strictly sequentially** — never concurrently. The
//! remote API enforces per-key rate limits and per-request cost, so a single
//! request in flight plus an explicit inter-page delay is the load-shedding
//! strategy: predictable, low request rate instead of cascading 429s across
//! every page at once.
//!
//! One page's exhaustion never aborts the batch; the engine always proceeds
//! to the next page and still hands a clearly labeled failure artifact to
//! the sink, so a partial-success batch is always usable.

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::outcome::{BatchReport, PageReport, TranslationOutcome};
use crate::pipeline::api::{GeminiClient, TranslationApi};
use crate::pipeline::attempt::{translate_page, PageRun};
use crate::pipeline::source::{scan_source_dir, PageJob, PageRange, SourceScan};
use crate::sink::PageArtifact;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Reason attached to every page when no API credential is available.
pub const MISSING_CREDENTIAL: &str = "missing credential";

/// Environment variable consulted when [`EngineConfig::api_key`] is unset.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Translate every page image in `range` under `source_dir`.
///
/// Rejects the whole request before any processing when the range is
/// malformed, the directory is missing, or the selection is empty. After
/// that, every selected page is guaranteed a terminal
/// [`TranslationOutcome`] — accepted text or a labeled failure — and the
/// sink receives one artifact per page plus a single end-of-batch signal.
///
/// # Errors
/// Only configuration-class failures return `Err`; per-page failures are
/// values inside the report.
pub async fn run_batch(
    source_dir: impl AsRef<Path>,
    range: PageRange,
    config: &EngineConfig,
) -> Result<BatchReport, EngineError> {
    let started = Instant::now();
    let SourceScan { jobs, total_pages } = scan_source_dir(source_dir.as_ref(), range)?;
    let selected = jobs.len();
    info!(
        "Batch start: {selected} page(s) in [{}, {}] of {total_pages} total",
        range.start, range.end
    );

    let cancel = config.cancel.clone().unwrap_or_else(CancelToken::never);

    if let Some(cb) = &config.progress {
        cb.on_batch_start(selected, total_pages);
    }

    let api = resolve_api(config)?;

    let mut reports: Vec<PageReport> = Vec::with_capacity(selected);
    let mut cancelled = false;

    match api {
        // No credential: terminal failure for every page, zero API calls,
        // no delays — there is nothing to back off from.
        None => {
            warn!("No API credential configured; failing all {selected} page(s)");
            for (idx, job) in jobs.iter().enumerate() {
                let report = missing_credential_report(job);
                finish_page(config, &report, job, total_pages, idx, selected);
                reports.push(report);
            }
        }
        Some(api) => {
            let instruction = config.instruction_text();
            for (idx, job) in jobs.iter().enumerate() {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                if let Some(cb) = &config.progress {
                    cb.on_page_start(job.page_number, selected);
                }

                match translate_page(api.as_ref(), job, &instruction, config, &cancel).await {
                    PageRun::Cancelled => {
                        cancelled = true;
                        break;
                    }
                    PageRun::Done(report) => {
                        finish_page(config, &report, job, total_pages, idx, selected);
                        reports.push(report);
                    }
                }

                // Fixed inter-page delay, independent of retry backoff,
                // keeps the steady-state request rate low.
                if idx + 1 < selected && !cancel.sleep(config.inter_page_delay).await {
                    cancelled = true;
                    break;
                }
            }
        }
    }

    let accepted = reports.iter().filter(|r| r.outcome.is_accepted()).count();
    let failed = reports.len() - accepted;

    // One signal for the whole batch, even on cancellation, so the renderer
    // can build navigation over whatever was produced.
    if let Some(sink) = &config.sink {
        sink.batch_ready(total_pages);
    }
    if let Some(cb) = &config.progress {
        cb.on_batch_complete(selected, accepted);
    }

    info!(
        "Batch done: {accepted} accepted, {failed} failed, cancelled={cancelled}, {}ms",
        started.elapsed().as_millis()
    );

    Ok(BatchReport {
        reports,
        total_pages,
        selected_pages: selected,
        accepted,
        failed,
        cancelled,
        total_duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Resolve the API client: injected instance, explicit key, then the
/// environment. `Ok(None)` means no credential anywhere.
fn resolve_api(config: &EngineConfig) -> Result<Option<Arc<dyn TranslationApi>>, EngineError> {
    if let Some(api) = &config.api {
        return Ok(Some(Arc::clone(api)));
    }

    let key = match &config.api_key {
        Some(k) if !k.is_empty() => Some(k.clone()),
        _ => std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
    };

    match key {
        Some(key) => {
            let client = GeminiClient::new(
                config.endpoint.clone(),
                config.model.clone(),
                key,
                config.call_timeout,
            )?;
            Ok(Some(Arc::new(client)))
        }
        None => Ok(None),
    }
}

pub(crate) fn missing_credential_report(job: &PageJob) -> PageReport {
    PageReport {
        page_number: job.page_number,
        source_file: job.file_name(),
        outcome: TranslationOutcome::Exhausted {
            reason: MISSING_CREDENTIAL.to_string(),
        },
        attempts: 0,
        duration_ms: 0,
    }
}

/// Per-page bookkeeping: progress fraction and artifact handoff.
fn finish_page(
    config: &EngineConfig,
    report: &PageReport,
    job: &PageJob,
    total_pages: u32,
    idx: usize,
    selected: usize,
) {
    if let Some(cb) = &config.progress {
        let fraction = (idx + 1) as f64 / selected as f64;
        cb.on_page_done(report.page_number, fraction, report.outcome.is_accepted());
    }
    if let Some(sink) = &config.sink {
        sink.page_ready(&PageArtifact {
            page_number: report.page_number,
            total_pages,
            source_file: job.file_name(),
            outcome: report.outcome.clone(),
        });
    }
}
