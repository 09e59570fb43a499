//! Failure classification: the retry/no-retry contract.
//!
//! Every failure a physical call can produce is reduced to one
//! [`FailureSignal`] variant, and a single priority-ordered match decides
//! whether retrying can possibly help. The split is by *cause*, not by
//! transport detail: failures that stem from the input being permanently
//! unacceptable (content-policy block, safety-filter finish, request-shape
//! errors) are fatal — the same input will fail again and each retry only
//! burns quota. Failures that stem from infrastructure or sampling variance
//! are retryable with backoff.
//!
//! Keeping the whole table in one `match` keeps the contract auditable:
//! every variant is covered, and the test for each rule reads straight off
//! the arm that implements it.

/// Closed set of failure causes a physical call can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSignal {
    /// Non-2xx HTTP status.
    HttpStatus(u16),
    /// The API refused the prompt itself (content policy), with its reason.
    PromptBlocked(String),
    /// Generation was terminated by a safety/content filter.
    SafetyFinish(String),
    /// Generation finished abnormally for a non-safety reason
    /// (recitation, token limit, other).
    AbnormalFinish(String),
    /// Well-formed envelope with no extractable text.
    EmptyContent,
    /// Response body could not be parsed, with the parse error.
    MalformedPayload(String),
    /// Local timeout or connection failure.
    Timeout(String),
}

/// Whether another physical call can help, plus the human-readable reason
/// surfaced in logs and failure artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Retryable(String),
    Fatal(String),
}

impl Disposition {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Disposition::Retryable(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            Disposition::Retryable(reason) | Disposition::Fatal(reason) => reason,
        }
    }
}

/// Classify one failure signal. Rules in priority order:
///
/// 1. HTTP 408/409/429/5xx → retryable (transient transport error).
/// 2. Any other non-2xx status → fatal (configuration or request-shape
///    error; resending the same request cannot change the answer).
/// 3. Prompt-level content-policy block → fatal.
/// 4. Safety-filter finish → fatal.
/// 5. Any other abnormal finish → retryable; a fresh sampling draw may
///    avoid the same truncation.
/// 6. Empty content → retryable.
/// 7. Malformed payload → retryable.
/// 8. Timeout / connection failure → retryable.
pub fn classify(signal: &FailureSignal) -> Disposition {
    match signal {
        FailureSignal::HttpStatus(code @ (408 | 409 | 429)) | FailureSignal::HttpStatus(code @ 500..) => {
            Disposition::Retryable(format!("transient transport error {code}"))
        }
        FailureSignal::HttpStatus(code) => {
            Disposition::Fatal(format!("non-retryable HTTP status {code}"))
        }
        FailureSignal::PromptBlocked(reason) => {
            Disposition::Fatal(format!("prompt blocked by content policy: {reason}"))
        }
        FailureSignal::SafetyFinish(reason) => {
            Disposition::Fatal(format!("generation stopped by safety filter: {reason}"))
        }
        FailureSignal::AbnormalFinish(reason) => {
            Disposition::Retryable(format!("abnormal finish reason: {reason}"))
        }
        FailureSignal::EmptyContent => Disposition::Retryable("empty content".to_string()),
        FailureSignal::MalformedPayload(detail) => {
            Disposition::Retryable(format!("malformed payload: {detail}"))
        }
        FailureSignal::Timeout(detail) => {
            Disposition::Retryable(format!("request timeout: {detail}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses_are_retryable_with_the_code_in_the_reason() {
        for code in [408u16, 409, 429, 500, 502, 503, 529] {
            let d = classify(&FailureSignal::HttpStatus(code));
            assert!(d.is_retryable(), "status {code} must be retryable");
            assert!(d.reason().contains(&code.to_string()), "got: {}", d.reason());
        }
    }

    #[test]
    fn client_errors_are_fatal() {
        for code in [400u16, 401, 403, 404, 422] {
            let d = classify(&FailureSignal::HttpStatus(code));
            assert!(!d.is_retryable(), "status {code} must be fatal");
        }
    }

    #[test]
    fn content_policy_block_is_never_retryable() {
        let d = classify(&FailureSignal::PromptBlocked("PROHIBITED_CONTENT".into()));
        assert!(!d.is_retryable());
        assert!(d.reason().contains("blocked"));
        assert!(d.reason().contains("PROHIBITED_CONTENT"));
    }

    #[test]
    fn safety_finish_is_fatal_but_other_finishes_are_not() {
        assert!(!classify(&FailureSignal::SafetyFinish("SAFETY".into())).is_retryable());
        assert!(classify(&FailureSignal::AbnormalFinish("RECITATION".into())).is_retryable());
        assert!(classify(&FailureSignal::AbnormalFinish("MAX_TOKENS".into())).is_retryable());
    }

    #[test]
    fn empty_content_uses_the_bare_reason() {
        let d = classify(&FailureSignal::EmptyContent);
        assert_eq!(d, Disposition::Retryable("empty content".into()));
    }

    #[test]
    fn local_failures_are_retryable() {
        assert!(classify(&FailureSignal::MalformedPayload("eof".into())).is_retryable());
        let d = classify(&FailureSignal::Timeout("deadline exceeded".into()));
        assert!(d.is_retryable());
        assert!(d.reason().contains("timeout"));
    }
}
