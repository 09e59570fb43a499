//! Page attempt loop: bounded logical attempts for one page.
//!
//! State machine: `Pending → Attempting → Validating → {Accepted |
//! Retryable → wait → Attempting | NotRetryable}`, bounded by the page
//! budget. Each iteration delegates the physical calls to the transport
//! loop, then validates the payload. A transport-level non-retryable failure
//! and a validator rejection funnel through the same decision point, so this
//! is the one place that decides whether a page keeps trying.
//!
//! Exhaustion carries the most recent failure reason — never silently
//! dropped.

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::outcome::{PageReport, TranslationOutcome};
use crate::pipeline::api::{PageRequest, TranslationApi};
use crate::pipeline::source::PageJob;
use crate::pipeline::transport::{run_transport_loop, TransportOutcome};
use crate::validate::validate;
use std::time::Instant;
use tracing::{info, warn};

/// Result of running one page to a terminal state.
#[derive(Debug)]
pub(crate) enum PageRun {
    Done(PageReport),
    /// A cancellation signal arrived mid-page; no outcome is produced and
    /// the engine skips the remaining pages.
    Cancelled,
}

/// Run the logical attempt loop for one page.
pub(crate) async fn translate_page(
    api: &dyn TranslationApi,
    job: &PageJob,
    instruction: &str,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> PageRun {
    let start = Instant::now();
    let source_file = job.file_name();

    let image = match tokio::fs::read(&job.image_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // A local read failure will not fix itself on retry.
            return PageRun::Done(report(
                job,
                &source_file,
                TranslationOutcome::Exhausted {
                    reason: format!("failed to read page image: {e}"),
                },
                0,
                start,
            ));
        }
    };

    let request = PageRequest {
        instruction: instruction.to_string(),
        image,
        mime_type: job.mime_type,
    };

    let mut last_reason = String::new();

    for attempt in 0..config.page_attempts {
        if attempt > 0 {
            let delay = config.page_backoff.delay_for_attempt(attempt - 1);
            info!(
                "Page {}: content retry {attempt}/{} after {delay:?} — {last_reason}",
                job.page_number,
                config.page_attempts - 1
            );
            if !cancel.sleep(delay).await {
                return PageRun::Cancelled;
            }
        }

        let transport = run_transport_loop(
            api,
            &request,
            job.page_number,
            config.transport_attempts,
            &config.transport_backoff,
            cancel,
        )
        .await;

        match transport {
            TransportOutcome::Cancelled => return PageRun::Cancelled,
            TransportOutcome::Failed { retryable: false, reason } => {
                // Permanent for this input; spending more attempts wastes quota.
                warn!("Page {}: not retryable — {reason}", job.page_number);
                return PageRun::Done(report(
                    job,
                    &source_file,
                    TranslationOutcome::Exhausted { reason },
                    attempt + 1,
                    start,
                ));
            }
            TransportOutcome::Failed { retryable: true, reason } => {
                last_reason = reason;
            }
            TransportOutcome::Payload(payload) => match validate(&payload, &config.rules) {
                Ok(text) => {
                    info!(
                        "Page {}: accepted after {} attempt(s)",
                        job.page_number,
                        attempt + 1
                    );
                    return PageRun::Done(report(
                        job,
                        &source_file,
                        TranslationOutcome::Accepted { text },
                        attempt + 1,
                        start,
                    ));
                }
                Err(reason) => {
                    // Malformed content is always worth a fresh draw.
                    warn!("Page {}: validation failed — {reason}", job.page_number);
                    last_reason = reason;
                }
            },
        }
    }

    PageRun::Done(report(
        job,
        &source_file,
        TranslationOutcome::Exhausted { reason: last_reason },
        config.page_attempts,
        start,
    ))
}

fn report(
    job: &PageJob,
    source_file: &str,
    outcome: TranslationOutcome,
    attempts: u32,
    start: Instant,
) -> PageReport {
    PageReport {
        page_number: job.page_number,
        source_file: source_file.to_string(),
        outcome,
        attempts,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::BackoffPolicy;
    use crate::classify::FailureSignal;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct Scripted {
        responses: Mutex<Vec<Result<String, FailureSignal>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<String, FailureSignal>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranslationApi for Scripted {
        async fn translate_page(&self, _: &PageRequest) -> Result<String, FailureSignal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(FailureSignal::EmptyContent))
        }
    }

    fn good_table() -> String {
        format!(
            "| {} | translated one |\n| {} | translated two |\n{}",
            "a".repeat(50),
            "b".repeat(50),
            crate::prompts::COMPLETION_MARKER
        )
    }

    fn fast_config() -> EngineConfig {
        let fast = BackoffPolicy {
            initial: Duration::from_millis(1),
            multiplier: 1.0,
            ceiling: Duration::from_millis(1),
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
        };
        EngineConfig::builder()
            .page_backoff(fast.clone())
            .transport_backoff(fast)
            .build()
            .unwrap()
    }

    fn job(dir: &std::path::Path) -> PageJob {
        let path = dir.join("page-001.png");
        std::fs::write(&path, b"img").unwrap();
        PageJob {
            image_path: path,
            page_number: 1,
            mime_type: "image/png",
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bad_content_is_retried_then_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let api = Scripted::new(vec![
            Ok("no table here".into()),
            Ok(good_table()),
        ]);
        let run = translate_page(&api, &job(dir.path()), "t", &fast_config(), &CancelToken::never()).await;
        let PageRun::Done(report) = run else { panic!("unexpected cancellation") };
        assert!(report.outcome.is_accepted());
        assert_eq!(report.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_transport_failure_stops_after_one_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let api = Scripted::new(vec![Err(FailureSignal::PromptBlocked("SAFETY".into()))]);
        let run = translate_page(&api, &job(dir.path()), "t", &fast_config(), &CancelToken::never()).await;
        let PageRun::Done(report) = run else { panic!("unexpected cancellation") };
        assert_eq!(report.attempts, 1);
        assert!(report
            .outcome
            .failure_reason()
            .unwrap()
            .contains("blocked"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_carries_the_last_reason() {
        let dir = tempfile::tempdir().unwrap();
        // Every attempt returns an empty payload; budget is 4.
        let api = Scripted::new(vec![]);
        let run = translate_page(&api, &job(dir.path()), "t", &fast_config(), &CancelToken::never()).await;
        let PageRun::Done(report) = run else { panic!("unexpected cancellation") };
        assert!(!report.outcome.is_accepted());
        assert_eq!(report.attempts, 4);
        assert_eq!(report.outcome.failure_reason().unwrap(), "empty content");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_image_fails_without_calling_the_api() {
        let api = Scripted::new(vec![Ok(good_table())]);
        let missing = PageJob {
            image_path: "/nope/page-001.png".into(),
            page_number: 1,
            mime_type: "image/png",
        };
        let run = translate_page(&api, &missing, "t", &fast_config(), &CancelToken::never()).await;
        let PageRun::Done(report) = run else { panic!("unexpected cancellation") };
        assert!(report
            .outcome
            .failure_reason()
            .unwrap()
            .contains("read page image"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }
}
