//! Terminal results: one [`TranslationOutcome`] per page, one
//! [`BatchReport`] per run.
//!
//! The outcome is the only thing that crosses the engine's boundary to the
//! external artifact renderer. A failed page is still a deliverable: its
//! artifact body literally states the failure reason and the source file
//! name so a human can re-run exactly that page.

use serde::{Deserialize, Serialize};

/// Terminal result for one page job. Exactly one is produced per page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationOutcome {
    /// The API returned a payload that passed validation. The text has the
    /// completion marker already stripped.
    Accepted { text: String },
    /// The retry budget is spent (or the failure was fatal); carries the
    /// most recent failure reason.
    Exhausted { reason: String },
}

impl TranslationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TranslationOutcome::Accepted { .. })
    }

    /// The failure reason, if this outcome is a failure.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            TranslationOutcome::Accepted { .. } => None,
            TranslationOutcome::Exhausted { reason } => Some(reason),
        }
    }

    /// The artifact body handed to the renderer: accepted text as-is, or a
    /// formatted failure marker naming the reason and the source image.
    pub fn artifact_body(&self, source_file: &str) -> String {
        match self {
            TranslationOutcome::Accepted { text } => text.clone(),
            TranslationOutcome::Exhausted { reason } => format!(
                "TRANSLATION FAILED\n\nreason: {reason}\nsource image: {source_file}\n\n\
                 Re-run this page once the cause is addressed."
            ),
        }
    }
}

/// Per-page accounting produced by the page attempt loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number parsed from the image file name.
    pub page_number: u32,
    /// Source image file name (not the full path).
    pub source_file: String,
    /// Terminal outcome for this page.
    pub outcome: TranslationOutcome,
    /// Page-tier attempts consumed (≥ 1 unless the batch was cancelled or
    /// the credential was missing).
    pub attempts: u32,
    /// Wall-clock time spent on this page, including backoff waits.
    pub duration_ms: u64,
}

/// Whole-batch accounting returned by [`crate::engine::run_batch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// One report per selected page, in page order. Pages skipped by
    /// cancellation are absent.
    pub reports: Vec<PageReport>,
    /// Total document page count: the maximum numeric suffix across *all*
    /// files in the source directory, not just the selection.
    pub total_pages: u32,
    /// Number of pages selected by the requested range.
    pub selected_pages: usize,
    /// Pages whose outcome is `Accepted`.
    pub accepted: usize,
    /// Pages whose outcome is `Exhausted`.
    pub failed: usize,
    /// True when a cancellation signal cut the batch short.
    pub cancelled: bool,
    /// Wall-clock time for the whole run.
    pub total_duration_ms: u64,
}
