//! # scanslate
//!
//! Retrieve structured bilingual translations of scanned page images from a
//! generative vision API, reliably.
//!
//! ## Why this crate?
//!
//! The hard problem is not asking a model to translate a page — it is making
//! an unreliable, rate-limited, occasionally content-filtering remote API
//! behave like a dependable batch step. scanslate guarantees that every page
//! in a requested range ends up with either a validated translation or a
//! clearly labeled failure artifact: it classifies failures, retries only
//! what is safe to retry, backs off without hammering the API, and checks
//! that a "successful" HTTP response actually contains a usable translation
//! table before accepting it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! page images (prefix-001.png …)
//!  │
//!  ├─ 1. Source     enumerate + select range, parse page numbers
//!  ├─ 2. Transport  physical call(s) with transport-tier backoff
//!  ├─ 3. Classify   retryable vs fatal, per ordered rule table
//!  ├─ 4. Validate   pipe-table shape, row/char floors, completion marker
//!  ├─ 5. Page loop  content-quality retries with page-tier backoff
//!  └─ 6. Outcome    Accepted(text) | Exhausted(reason), per page
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scanslate::{run_batch, EngineConfig, PageRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential auto-detected from GEMINI_API_KEY when not set here.
//!     let config = EngineConfig::default();
//!     let report = run_batch("pages/", PageRange::new(1, 10), &config).await?;
//!     for page in &report.reports {
//!         println!("page {}: accepted={}", page.page_number, page.outcome.is_accepted());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## The two retry tiers
//!
//! | Tier | Absorbs | Budget (default) | Backoff |
//! |------|---------|------------------|---------|
//! | Transport | 429/5xx/408/409, timeouts, malformed bodies | 6 calls | `min(60s, 4s·1.6ⁿ)` + jitter |
//! | Page | empty/truncated/malformed tables, abnormal finishes | 4 attempts | `min(180s, 12s·1.5ⁿ)` + jitter |
//!
//! Content-policy blocks and safety-filter finishes are never retried — the
//! same input will be blocked again, and each retry only burns quota.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scanslate` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backoff;
pub mod cancel;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod sink;
pub mod stream;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backoff::BackoffPolicy;
pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use classify::{classify, Disposition, FailureSignal};
pub use config::{EngineConfig, EngineConfigBuilder, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use engine::{run_batch, API_KEY_ENV, MISSING_CREDENTIAL};
pub use error::EngineError;
pub use outcome::{BatchReport, PageReport, TranslationOutcome};
pub use pipeline::api::{GeminiClient, PageRequest, TranslationApi};
pub use pipeline::source::{PageJob, PageRange};
pub use progress::{BatchProgress, NoopProgress, ProgressCallback};
pub use prompts::{page_instruction, COMPLETION_MARKER, DEFAULT_TARGET_LANG};
pub use sink::{ArtifactSink, NoopSink, PageArtifact, SharedSink};
pub use stream::{run_stream, PageReportStream};
pub use validate::{validate, validate_stripped, TableRules};
