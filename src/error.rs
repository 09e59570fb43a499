//! Error types for the scanslate library.
//!
//! Two distinct failure modes get two distinct representations:
//!
//! * [`EngineError`] — **Fatal**: the batch cannot start at all (invalid page
//!   range, missing source directory, bad configuration). Returned as
//!   `Err(EngineError)` from the top-level entry points before any page is
//!   processed.
//!
//! * Per-page failures are **values**, not errors:
//!   [`crate::outcome::TranslationOutcome::Exhausted`] carries the last
//!   failure reason so one bad page never aborts the batch and a
//!   partial-success run is always usable.
//!
//! A missing API credential is deliberately *not* an `EngineError`: the
//! engine still enumerates the range and produces a clearly labeled
//! `Exhausted` outcome per page (with zero API calls), so the downstream
//! renderer can still build a complete, navigable artifact set.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the scanslate library.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The page-image source directory does not exist or is not a directory.
    #[error("source directory not found: '{path}'\nCheck that the page-image producer has run.")]
    SourceDirNotFound { path: PathBuf },

    /// Requested range is malformed (`start < 1` or `end < start`).
    #[error("invalid page range [{start}, {end}]: start must be ≥ 1 and end ≥ start")]
    InvalidPageRange { start: u32, end: u32 },

    /// The range is well-formed but selects no page images.
    #[error("no page images found in range [{start}, {end}] (directory has {total} pages)")]
    EmptyPageRange { start: u32, end: u32, total: u32 },

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Reading the source directory or a page image failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
