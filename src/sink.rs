//! Boundary to the external artifact renderer.
//!
//! The engine does not render HTML, write styled pages, or build navigation;
//! it hands each terminal outcome across this trait and signals once when
//! the whole batch is done so the renderer can build cross-page navigation
//! and an index artifact.

use crate::outcome::TranslationOutcome;
use std::sync::Arc;

/// Everything the renderer needs for one page artifact.
#[derive(Debug, Clone)]
pub struct PageArtifact {
    /// 1-indexed page number.
    pub page_number: u32,
    /// Total document page count (for navigation), not the selection size.
    pub total_pages: u32,
    /// File name of the source image this page came from.
    pub source_file: String,
    /// The terminal outcome. Use
    /// [`TranslationOutcome::artifact_body`] for a render-ready body that
    /// labels failures with reason and source file.
    pub outcome: TranslationOutcome,
}

/// Receives per-page artifacts and the end-of-batch signal.
///
/// Methods default to no-ops; implement only what the renderer consumes.
pub trait ArtifactSink: Send + Sync {
    /// Called once per page, immediately after its outcome is terminal.
    fn page_ready(&self, artifact: &PageArtifact) {
        let _ = artifact;
    }

    /// Called exactly once per batch, after the last page (even when some
    /// pages failed or the batch was cancelled), so an index/landing
    /// artifact can be produced.
    fn batch_ready(&self, total_pages: u32) {
        let _ = total_pages;
    }
}

/// Sink for callers that only consume the returned [`crate::BatchReport`].
pub struct NoopSink;

impl ArtifactSink for NoopSink {}

/// Convenience alias matching the type stored in [`crate::config::EngineConfig`].
pub type SharedSink = Arc<dyn ArtifactSink>;
