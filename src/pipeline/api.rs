//! One physical call to the translation API.
//!
//! [`TranslationApi`] is the injection seam: the engine only ever sees this
//! trait, so tests script failures without a network and alternative
//! gateways can be dropped in. [`GeminiClient`] is the production
//! implementation, speaking the Gemini-style `generateContent` wire format.
//!
//! A successful return means "got a textual payload", nothing more —
//! whether the payload is a usable translation table is decided upstream by
//! [`crate::validate`]. Everything that is not a textual payload is reduced
//! to a [`FailureSignal`] for the classifier; this module never decides
//! retryability itself.

use crate::classify::FailureSignal;
use crate::error::EngineError;
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Everything needed for one page call.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Natural-language instruction describing the expected table format,
    /// completion marker, and translation rules.
    pub instruction: String,
    /// Raw page image bytes.
    pub image: Vec<u8>,
    /// Resolved MIME type of the image.
    pub mime_type: &'static str,
}

/// Abstract translation API: one request in, raw text or a failure signal
/// out.
#[async_trait]
pub trait TranslationApi: Send + Sync {
    async fn translate_page(&self, request: &PageRequest) -> Result<String, FailureSignal>;
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    Text(&'a str),
    InlineData(InlineData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    /// Base64-encoded image bytes.
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Finish reasons that mean the safety/content filter cut generation off.
/// Any other non-STOP reason (RECITATION, MAX_TOKENS, OTHER) is an abnormal
/// finish a fresh sampling draw may avoid.
const SAFETY_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
];

// ── Production client ────────────────────────────────────────────────────

/// Gemini-style `generateContent` client over a reusable HTTP connection.
///
/// Safe for sequential reuse across calls; the engine never calls it
/// concurrently.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client with a per-call timeout. There is no overall batch
    /// timeout; this bounds each individual remote call.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        call_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(|e| EngineError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Reduce a response envelope to text or a failure signal.
    fn extract_text(response: GenerateResponse) -> Result<String, FailureSignal> {
        if let Some(feedback) = &response.prompt_feedback {
            if let Some(reason) = feedback.block_reason.as_deref().filter(|r| !r.is_empty()) {
                return Err(FailureSignal::PromptBlocked(reason.to_string()));
            }
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(FailureSignal::EmptyContent);
        };

        if let Some(finish) = candidate.finish_reason.as_deref() {
            if finish != "STOP" {
                return if SAFETY_FINISH_REASONS.contains(&finish) {
                    Err(FailureSignal::SafetyFinish(finish.to_string()))
                } else {
                    Err(FailureSignal::AbnormalFinish(finish.to_string()))
                };
            }
        }

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(FailureSignal::EmptyContent);
        }
        Ok(text)
    }
}

#[async_trait]
impl TranslationApi for GeminiClient {
    async fn translate_page(&self, request: &PageRequest) -> Result<String, FailureSignal> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text(&request.instruction),
                    RequestPart::InlineData(InlineData {
                        mime_type: request.mime_type,
                        data: base64::engine::general_purpose::STANDARD.encode(&request.image),
                    }),
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 8192,
            },
        };

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    FailureSignal::Timeout(e.to_string())
                } else {
                    FailureSignal::MalformedPayload(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureSignal::HttpStatus(status.as_u16()));
        }

        let envelope: GenerateResponse = response
            .json()
            .await
            .map_err(|e| FailureSignal::MalformedPayload(e.to_string()))?;

        debug!("Received {} candidate(s)", envelope.candidates.len());
        Self::extract_text(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> GenerateResponse {
        serde_json::from_str(json).expect("test envelope must parse")
    }

    #[test]
    fn extracts_concatenated_text_parts() {
        let response = envelope(
            r#"{"candidates":[{"content":{"parts":[{"text":"| a | b |"},{"text":"\n| c | d |"}]},"finishReason":"STOP"}]}"#,
        );
        let text = GeminiClient::extract_text(response).unwrap();
        assert_eq!(text, "| a | b |\n| c | d |");
    }

    #[test]
    fn block_reason_wins_over_candidates() {
        let response = envelope(
            r#"{"candidates":[{"content":{"parts":[{"text":"x"}]}}],"promptFeedback":{"blockReason":"PROHIBITED_CONTENT"}}"#,
        );
        let err = GeminiClient::extract_text(response).unwrap_err();
        assert_eq!(err, FailureSignal::PromptBlocked("PROHIBITED_CONTENT".into()));
    }

    #[test]
    fn safety_finish_is_distinguished_from_other_finishes() {
        let safety = envelope(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
        assert!(matches!(
            GeminiClient::extract_text(safety),
            Err(FailureSignal::SafetyFinish(_))
        ));

        let recitation = envelope(r#"{"candidates":[{"finishReason":"RECITATION"}]}"#);
        assert!(matches!(
            GeminiClient::extract_text(recitation),
            Err(FailureSignal::AbnormalFinish(_))
        ));
    }

    #[test]
    fn empty_envelope_is_empty_content() {
        let no_candidates = envelope(r#"{}"#);
        assert_eq!(
            GeminiClient::extract_text(no_candidates).unwrap_err(),
            FailureSignal::EmptyContent
        );

        let blank_text = envelope(
            r#"{"candidates":[{"content":{"parts":[{"text":"   "}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(
            GeminiClient::extract_text(blank_text).unwrap_err(),
            FailureSignal::EmptyContent
        );
    }

    #[test]
    fn request_serialises_to_camel_case_wire_format() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text("translate"),
                    RequestPart::InlineData(InlineData {
                        mime_type: "image/png",
                        data: "aW1n".into(),
                    }),
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 8192,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""inlineData""#), "got: {json}");
        assert!(json.contains(r#""mimeType":"image/png""#));
        assert!(json.contains(r#""generationConfig""#));
        assert!(json.contains(r#""maxOutputTokens":8192"#));
    }

    #[test]
    fn endpoint_trailing_slash_is_normalised() {
        let client = GeminiClient::new(
            "https://example.test/v1beta/",
            "gemini-2.0-flash",
            "key",
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
