//! Progress-callback trait for per-page batch events.
//!
//! Inject an [`std::sync::Arc<dyn BatchProgress>`] via
//! [`crate::config::EngineConfigBuilder::progress`] to receive events as the
//! engine works through the selected range. Callbacks are the least-invasive
//! integration point: the host can forward them to a progress bar, a log, or
//! a channel without the library knowing how the host communicates.
//!
//! Pages are processed strictly sequentially, so implementations never see
//! two events for different pages interleave; `Send + Sync` is still
//! required because the engine future may migrate between runtime threads.

use std::sync::Arc;

/// Called by the engine as it processes each page. All methods default to
/// no-ops so callers override only what they care about.
pub trait BatchProgress: Send + Sync {
    /// Called once before any page is attempted.
    fn on_batch_start(&self, selected_pages: usize, total_pages: u32) {
        let _ = (selected_pages, total_pages);
    }

    /// Called just before the first attempt for a page.
    fn on_page_start(&self, page_number: u32, selected_pages: usize) {
        let _ = (page_number, selected_pages);
    }

    /// Called after a page reaches its terminal outcome.
    ///
    /// `fraction` is `pages_done / selected_pages` in `(0, 1]`, advancing
    /// monotonically — the write-once-per-page progress counter.
    fn on_page_done(&self, page_number: u32, fraction: f64, accepted: bool) {
        let _ = (page_number, fraction, accepted);
    }

    /// Called once after the last page (or on cancellation), with the number
    /// of pages that produced an `Accepted` outcome.
    fn on_batch_complete(&self, selected_pages: usize, accepted: usize) {
        let _ = (selected_pages, accepted);
    }
}

/// No-op implementation used when no callback is configured.
pub struct NoopProgress;

impl BatchProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::EngineConfig`].
pub type ProgressCallback = Arc<dyn BatchProgress>;
