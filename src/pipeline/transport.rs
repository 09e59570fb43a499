//! Transport attempt loop: bounded physical retries for one logical attempt.
//!
//! State machine: `Idle → Calling → {Succeeded | TransientFailure → wait →
//! Calling | FatalFailure}`, bounded by the transport budget. Exhausting the
//! budget with only transient failures returns the last failure as a value,
//! not an error — the page tier decides what happens next.
//!
//! Transport success only means "got a response"; validation belongs to the
//! caller.

use crate::backoff::BackoffPolicy;
use crate::cancel::CancelToken;
use crate::classify::{classify, Disposition};
use crate::pipeline::api::{PageRequest, TranslationApi};
use tracing::{debug, warn};

/// Outcome of one logical attempt's worth of physical calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TransportOutcome {
    /// A response with a textual payload arrived (not yet validated).
    Payload(String),
    /// No payload; `retryable` tells the page tier whether another logical
    /// attempt can help.
    Failed { retryable: bool, reason: String },
    /// A cancellation signal interrupted a backoff wait.
    Cancelled,
}

/// Run up to `attempts` physical calls, backing off between transient
/// failures.
pub(crate) async fn run_transport_loop(
    api: &dyn TranslationApi,
    request: &PageRequest,
    page_number: u32,
    attempts: u32,
    backoff: &BackoffPolicy,
    cancel: &CancelToken,
) -> TransportOutcome {
    let mut last_reason = String::new();

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = backoff.delay_for_attempt(attempt - 1);
            debug!(
                "Page {page_number}: transport retry {attempt}/{} after {delay:?}",
                attempts - 1
            );
            if !cancel.sleep(delay).await {
                return TransportOutcome::Cancelled;
            }
        }

        match api.translate_page(request).await {
            Ok(payload) => return TransportOutcome::Payload(payload),
            Err(signal) => match classify(&signal) {
                Disposition::Fatal(reason) => {
                    warn!("Page {page_number}: fatal transport failure — {reason}");
                    return TransportOutcome::Failed {
                        retryable: false,
                        reason,
                    };
                }
                Disposition::Retryable(reason) => {
                    warn!(
                        "Page {page_number}: transport attempt {} failed — {reason}",
                        attempt + 1
                    );
                    last_reason = reason;
                }
            },
        }
    }

    TransportOutcome::Failed {
        retryable: true,
        reason: last_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FailureSignal;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted API: pops one result per call, counts calls.
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

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
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

    fn request() -> PageRequest {
        PageRequest {
            instruction: "translate".into(),
            image: vec![1, 2, 3],
            mime_type: "image/png",
        }
    }

    fn fast_backoff() -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_millis(1),
            multiplier: 1.0,
            ceiling: Duration::from_millis(1),
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_absorbed() {
        let api = Scripted::new(vec![
            Err(FailureSignal::HttpStatus(429)),
            Err(FailureSignal::HttpStatus(503)),
            Ok("payload".into()),
        ]);
        let outcome = run_transport_loop(
            &api,
            &request(),
            1,
            6,
            &fast_backoff(),
            &CancelToken::never(),
        )
        .await;
        assert_eq!(outcome, TransportOutcome::Payload("payload".into()));
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_failure_short_circuits() {
        let api = Scripted::new(vec![Err(FailureSignal::PromptBlocked("SAFETY".into()))]);
        let outcome = run_transport_loop(
            &api,
            &request(),
            1,
            6,
            &fast_backoff(),
            &CancelToken::never(),
        )
        .await;
        match outcome {
            TransportOutcome::Failed { retryable, reason } => {
                assert!(!retryable);
                assert!(reason.contains("blocked"));
            }
            other => panic!("expected fatal failure, got {other:?}"),
        }
        assert_eq!(api.calls(), 1, "no retry after a fatal classification");
    }

    #[tokio::test(start_paused = true)]
    async fn budget_exhaustion_returns_last_transient_reason() {
        let api = Scripted::new(vec![
            Err(FailureSignal::HttpStatus(500)),
            Err(FailureSignal::Timeout("deadline".into())),
        ]);
        let outcome = run_transport_loop(
            &api,
            &request(),
            1,
            2,
            &fast_backoff(),
            &CancelToken::never(),
        )
        .await;
        match outcome {
            TransportOutcome::Failed { retryable, reason } => {
                assert!(retryable);
                assert!(reason.contains("timeout"), "got: {reason}");
            }
            other => panic!("expected transient exhaustion, got {other:?}"),
        }
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff_wait() {
        let api = Scripted::new(vec![
            Err(FailureSignal::HttpStatus(429)),
            Ok("never reached".into()),
        ]);
        let (handle, token) = crate::cancel::cancel_pair();
        handle.cancel();
        let slow = BackoffPolicy {
            initial: Duration::from_secs(3600),
            ..fast_backoff()
        };
        let outcome = run_transport_loop(&api, &request(), 1, 6, &slow, &token).await;
        assert_eq!(outcome, TransportOutcome::Cancelled);
        assert_eq!(api.calls(), 1);
    }
}
