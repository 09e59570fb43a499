//! Enumeration of the external page-image producer's output.
//!
//! The producer writes files named `prefix-<zero-padded-number>.<ext>`; the
//! numeric suffix gives page order and range membership. Files that do not
//! match the pattern are ignored. The total document page count is the
//! maximum parsed suffix across *all* matching files in the directory, not
//! just the selected range — the renderer needs it for cross-page
//! navigation even when only a slice is translated.

use crate::error::EngineError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One page image waiting to be translated. Immutable once enumerated.
#[derive(Debug, Clone)]
pub struct PageJob {
    /// Full path to the page image.
    pub image_path: PathBuf,
    /// 1-indexed page number parsed from the file name suffix.
    pub page_number: u32,
    /// MIME type resolved from the file extension.
    pub mime_type: &'static str,
}

impl PageJob {
    /// The source file name (without directory), used in failure artifacts.
    pub fn file_name(&self) -> String {
        self.image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.image_path.display().to_string())
    }
}

/// Inclusive 1-indexed page range requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Reject malformed bounds before any page processing begins.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start < 1 || self.end < self.start {
            return Err(EngineError::InvalidPageRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= self.start && page <= self.end
    }
}

/// Result of scanning the source directory.
#[derive(Debug)]
pub struct SourceScan {
    /// Selected jobs, sorted by page number.
    pub jobs: Vec<PageJob>,
    /// Maximum page number across all matching files in the directory.
    pub total_pages: u32,
}

/// Trailing `-<digits>.<ext>` of a page-image file name.
static PAGE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(\d+)\.[A-Za-z0-9]+$").expect("static regex must compile"));

/// Parse the 1-indexed page number from a file name, or `None` when the
/// name does not follow the producer's pattern.
pub fn page_number_from_name(name: &str) -> Option<u32> {
    PAGE_SUFFIX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Resolve the MIME type from the file extension. Defaults to `image/png`
/// for unknown extensions — the API rejects payloads it cannot decode, and
/// that failure is classified like any other.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Enumerate page images in `dir` and select those within `range`.
///
/// Fails when the directory is missing; an empty selection is reported via
/// [`EngineError::EmptyPageRange`] so the whole request is rejected before
/// any API call.
pub fn scan_source_dir(dir: &Path, range: PageRange) -> Result<SourceScan, EngineError> {
    range.validate()?;

    if !dir.is_dir() {
        return Err(EngineError::SourceDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| EngineError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut jobs = Vec::new();
    let mut total_pages = 0u32;

    for entry in entries {
        let entry = entry.map_err(|e| EngineError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };
        let Some(page_number) = page_number_from_name(&name) else {
            debug!("Ignoring non-page file: {name}");
            continue;
        };

        total_pages = total_pages.max(page_number);

        if range.contains(page_number) {
            jobs.push(PageJob {
                mime_type: mime_for_path(&path),
                image_path: path,
                page_number,
            });
        }
    }

    if jobs.is_empty() {
        return Err(EngineError::EmptyPageRange {
            start: range.start,
            end: range.end,
            total: total_pages,
        });
    }

    jobs.sort_by_key(|job| job.page_number);
    debug!(
        "Selected {} of {} pages in [{}, {}]",
        jobs.len(),
        total_pages,
        range.start,
        range.end
    );

    Ok(SourceScan { jobs, total_pages })
}
