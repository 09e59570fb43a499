//! Configuration for a translation-retrieval batch.
//!
//! All behaviour is controlled through [`EngineConfig`], built via its
//! [`EngineConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs, log them, and diff two runs to understand why their
//! outputs differ.

use crate::backoff::BackoffPolicy;
use crate::cancel::CancelToken;
use crate::error::EngineError;
use crate::pipeline::api::TranslationApi;
use crate::progress::ProgressCallback;
use crate::sink::SharedSink;
use crate::validate::TableRules;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default Gemini-style endpoint base. Overridable for compatible gateways
/// and for wire-level tests.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for one batch run.
///
/// Built via [`EngineConfig::builder()`] or [`EngineConfig::default()`].
///
/// # Example
/// ```rust
/// use scanslate::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .api_key("secret")
///     .page_attempts(3)
///     .transport_attempts(5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct EngineConfig {
    /// API credential. When `None`, `GEMINI_API_KEY` is consulted at run
    /// time; if that is also absent, every page yields
    /// `Exhausted("missing credential")` without any API call.
    pub api_key: Option<String>,

    /// Pre-constructed API client. Takes precedence over `api_key`.
    /// Useful in tests or when the caller needs custom middleware.
    pub api: Option<Arc<dyn TranslationApi>>,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Endpoint base URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Target language inserted into the instruction text.
    /// Default: [`crate::prompts::DEFAULT_TARGET_LANG`].
    pub target_lang: String,

    /// Custom instruction text. If `None`, the built-in instruction for
    /// `target_lang` is used.
    pub instruction: Option<String>,

    /// Logical (content-quality) attempts per page. Default: 4.
    ///
    /// Each logical attempt is a full transport loop plus validation.
    /// Must be ≥ 1; the engine never retries indefinitely.
    pub page_attempts: u32,

    /// Physical network calls per logical attempt. Default: 6.
    ///
    /// Absorbs 429/5xx/timeout blips without consuming a page attempt.
    /// Must be ≥ 1.
    pub transport_attempts: u32,

    /// Backoff curve between page-tier retries. Default: [`BackoffPolicy::page`].
    pub page_backoff: BackoffPolicy,

    /// Backoff curve between transport-tier retries.
    /// Default: [`BackoffPolicy::transport`].
    pub transport_backoff: BackoffPolicy,

    /// Fixed delay between consecutive pages, independent of retry backoff.
    /// Keeps the steady-state request rate low regardless of outcome.
    /// Default: 2s.
    pub inter_page_delay: Duration,

    /// Per-call timeout for one remote request. There is no overall batch
    /// timeout. Default: 300s — vision generations on dense pages are slow.
    pub call_timeout: Duration,

    /// Structural acceptance thresholds for the translation table.
    pub rules: TableRules,

    /// Progress observer. Default: none.
    pub progress: Option<ProgressCallback>,

    /// Artifact sink (the renderer boundary). Default: none.
    pub sink: Option<SharedSink>,

    /// Cancellation token; all waits observe it. Default: never cancelled.
    pub cancel: Option<CancelToken>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            target_lang: crate::prompts::DEFAULT_TARGET_LANG.to_string(),
            instruction: None,
            page_attempts: 4,
            transport_attempts: 6,
            page_backoff: BackoffPolicy::page(),
            transport_backoff: BackoffPolicy::transport(),
            inter_page_delay: Duration::from_secs(2),
            call_timeout: Duration::from_secs(300),
            rules: TableRules::default(),
            progress: None,
            sink: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api", &self.api.as_ref().map(|_| "<dyn TranslationApi>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("target_lang", &self.target_lang)
            .field("page_attempts", &self.page_attempts)
            .field("transport_attempts", &self.transport_attempts)
            .field("inter_page_delay", &self.inter_page_delay)
            .field("call_timeout", &self.call_timeout)
            .field("rules", &self.rules)
            .finish()
    }
}

impl EngineConfig {
    /// Create a new builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The instruction text actually sent with each page image.
    pub fn instruction_text(&self) -> String {
        match &self.instruction {
            Some(text) => text.clone(),
            None => crate::prompts::page_instruction(&self.target_lang),
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api(mut self, api: Arc<dyn TranslationApi>) -> Self {
        self.config.api = Some(api);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn target_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.target_lang = lang.into();
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = Some(text.into());
        self
    }

    pub fn page_attempts(mut self, n: u32) -> Self {
        self.config.page_attempts = n.max(1);
        self
    }

    pub fn transport_attempts(mut self, n: u32) -> Self {
        self.config.transport_attempts = n.max(1);
        self
    }

    pub fn page_backoff(mut self, policy: BackoffPolicy) -> Self {
        self.config.page_backoff = policy;
        self
    }

    pub fn transport_backoff(mut self, policy: BackoffPolicy) -> Self {
        self.config.transport_backoff = policy;
        self
    }

    pub fn inter_page_delay(mut self, delay: Duration) -> Self {
        self.config.inter_page_delay = delay;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    pub fn rules(mut self, rules: TableRules) -> Self {
        self.config.rules = rules;
        self
    }

    pub fn progress(mut self, cb: ProgressCallback) -> Self {
        self.config.progress = Some(cb);
        self
    }

    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.config.sink = Some(sink);
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EngineConfig, EngineError> {
        let c = &self.config;
        if c.page_attempts == 0 {
            return Err(EngineError::InvalidConfig("page_attempts must be ≥ 1".into()));
        }
        if c.transport_attempts == 0 {
            return Err(EngineError::InvalidConfig(
                "transport_attempts must be ≥ 1".into(),
            ));
        }
        if c.rules.completion_marker.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "completion_marker must be non-empty".into(),
            ));
        }
        if c.endpoint.trim().is_empty() {
            return Err(EngineError::InvalidConfig("endpoint must be non-empty".into()));
        }
        Ok(self.config)
    }
}
