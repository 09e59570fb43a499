//! Streaming API: one [`PageReport`] per step.
//!
//! The sequential batch is naturally a generator — each step yields the
//! terminal outcome for one page. The stream form lets hosts consume
//! outcomes with whatever concurrency model they already have (render as
//! they arrive, persist incrementally) instead of waiting for the whole
//! batch. Pages are still processed strictly sequentially and the
//! inter-page delay still applies between items.
//!
//! Unlike [`crate::engine::run_batch`], the stream carries no progress
//! callbacks or sink handoff; the consumer *is* the observer.

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::engine::missing_credential_report;
use crate::error::EngineError;
use crate::outcome::PageReport;
use crate::pipeline::api::{GeminiClient, TranslationApi};
use crate::pipeline::attempt::{translate_page, PageRun};
use crate::pipeline::source::{scan_source_dir, PageJob, PageRange, SourceScan};
use futures::stream;
use std::collections::VecDeque;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;

/// A boxed stream of per-page reports, in page order.
pub type PageReportStream = Pin<Box<dyn Stream<Item = PageReport> + Send>>;

struct StreamState {
    jobs: VecDeque<PageJob>,
    api: Option<Arc<dyn TranslationApi>>,
    config: EngineConfig,
    cancel: CancelToken,
    instruction: String,
    emitted_any: bool,
}

/// Translate the selected range, yielding each page's terminal report as it
/// is produced. The stream ends early (without an item) on cancellation.
///
/// # Errors
/// Fails up front for configuration-class problems (bad range, missing
/// directory, empty selection); per-page failures are items.
pub async fn run_stream(
    source_dir: impl AsRef<Path>,
    range: PageRange,
    config: &EngineConfig,
) -> Result<PageReportStream, EngineError> {
    let SourceScan { jobs, .. } = scan_source_dir(source_dir.as_ref(), range)?;

    let api: Option<Arc<dyn TranslationApi>> = if let Some(api) = &config.api {
        Some(Arc::clone(api))
    } else {
        let key = match &config.api_key {
            Some(k) if !k.is_empty() => Some(k.clone()),
            _ => std::env::var(crate::engine::API_KEY_ENV)
                .ok()
                .filter(|k| !k.is_empty()),
        };
        match key {
            Some(key) => Some(Arc::new(GeminiClient::new(
                config.endpoint.clone(),
                config.model.clone(),
                key,
                config.call_timeout,
            )?)),
            None => None,
        }
    };

    let state = StreamState {
        jobs: jobs.into(),
        api,
        instruction: config.instruction_text(),
        cancel: config.cancel.clone().unwrap_or_else(CancelToken::never),
        config: config.clone(),
        emitted_any: false,
    };

    let s = stream::unfold(state, |mut st| async move {
        let job = st.jobs.pop_front()?;

        let report = match st.api.clone() {
            // Credential-less runs emit immediately; no rate to protect.
            None => missing_credential_report(&job),
            Some(api) => {
                if st.emitted_any && !st.cancel.sleep(st.config.inter_page_delay).await {
                    return None;
                }
                if st.cancel.is_cancelled() {
                    return None;
                }
                match translate_page(api.as_ref(), &job, &st.instruction, &st.config, &st.cancel)
                    .await
                {
                    PageRun::Done(report) => report,
                    PageRun::Cancelled => return None,
                }
            }
        };

        st.emitted_any = true;
        Some((report, st))
    });

    Ok(Box::pin(s))
}
