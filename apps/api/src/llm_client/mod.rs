/// LLM Client: the single point of entry for all Gemini API calls in the portal.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions MUST go through the `TextGenerator` trait defined here.
///
/// Model: gemini-2.0-flash (hardcoded, do not make configurable to prevent drift)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls in the portal.
pub const MODEL: &str = "gemini-2.0-flash";
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Speaker of a conversation turn, in Gemini's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Anything that can turn a conversation into a single text reply.
/// `LlmClient` is the production implementation; tests script their own.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: Option<&str>, turns: &[Turn]) -> Result<String, LlmError>;

    /// Single-shot prompt with no system instruction.
    async fn prompt(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate(None, &[Turn::user(prompt)]).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: Role,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GeminiResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// How many times a call is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles for each one after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: BASE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Backoff before the zero-based `attempt`. The first attempt never waits.
    fn delay_before(&self, attempt: u32) -> Option<Duration> {
        (attempt > 0).then(|| self.base_delay * (1 << (attempt - 1)))
    }
}

/// Quota (429) and server-side (5xx) failures are worth another attempt.
/// Any other non-success status is final.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// The single LLM client used by all services in the portal.
/// Wraps the Gemini generateContent API with a per-call timeout and retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self::with_http_client(
            Client::builder().timeout(timeout).build()?,
            api_key,
        ))
    }

    fn with_http_client(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Points the client at another models endpoint (`<base>/<model>:generateContent`).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[cfg(test)]
    fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Makes a raw call to the Gemini API, returning the full response object.
    /// Retries on transport errors, 429 (quota) and 5xx with exponential backoff.
    pub async fn call(
        &self,
        system: Option<&str>,
        turns: &[Turn],
    ) -> Result<GeminiResponse, LlmError> {
        let request_body = build_request(system, turns);
        let url = format!("{}/{MODEL}:generateContent", self.base_url);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.retry.max_attempts {
            if let Some(delay) = self.retry.delay_before(attempt) {
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if is_retryable(status) {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let gemini_response: GeminiResponse = response.json().await?;

            if let Some(usage) = &gemini_response.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, candidate_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(gemini_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.retry.max_attempts,
        }))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, system: Option<&str>, turns: &[Turn]) -> Result<String, LlmError> {
        self.call(system, turns)
            .await?
            .text()
            .ok_or(LlmError::EmptyContent)
    }
}

fn build_request<'a>(system: Option<&'a str>, turns: &'a [Turn]) -> GeminiRequest<'a> {
    GeminiRequest {
        contents: turns
            .iter()
            .map(|t| GeminiContent {
                role: t.role,
                parts: vec![GeminiPart { text: &t.text }],
            })
            .collect(),
        system_instruction: system.map(|text| GeminiSystemInstruction {
            parts: vec![GeminiPart { text }],
        }),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned replies in order and records every prompt it receives.
    #[derive(Default)]
    pub struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        pub seen: Mutex<Vec<(Option<String>, Vec<Turn>)>>,
    }

    impl ScriptedGenerator {
        pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            system: Option<&str>,
            turns: &[Turn],
        ) -> Result<String, LlmError> {
            self.seen
                .lock()
                .unwrap()
                .push((system.map(String::from), turns.to_vec()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_request_serializes_roles_and_system_instruction() {
        let turns = vec![Turn::user("hi"), Turn::model("hello"), Turn::user("explain")];
        let body = serde_json::to_value(build_request(Some("be brief"), &turns)).unwrap();

        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "explain");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
    }

    #[test]
    fn test_request_omits_missing_system_instruction() {
        let turns = vec![Turn::user("grade this")];
        let body = serde_json::to_value(build_request(None, &turns)).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_joins_parts_of_first_candidate() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Estimated Score "}, {"text": "(0-100): 91"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 40}
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.text().as_deref(),
            Some("Estimated Score (0-100): 91")
        );
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, 120);
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(response.text().is_none());

        let blocked: GeminiResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert!(blocked.text().is_none());
    }

    const OK_BODY: &str = r#"{"candidates": [{"content": {"parts": [{"text": "Estimated Score (0-100): 88"}]}}]}"#;

    struct Stub {
        replies: std::sync::Mutex<std::collections::VecDeque<(u16, &'static str)>>,
        hits: std::sync::atomic::AtomicUsize,
    }

    /// Serves the scripted `(status, body)` replies in order on a local port and
    /// returns a client pointed at it.
    async fn stub_client(
        replies: Vec<(u16, &'static str)>,
    ) -> (LlmClient, std::sync::Arc<Stub>) {
        use axum::http::StatusCode as AxumStatus;
        use std::sync::atomic::Ordering;

        let stub = std::sync::Arc::new(Stub {
            replies: std::sync::Mutex::new(replies.into()),
            hits: Default::default(),
        });
        let shared = stub.clone();
        let app = axum::Router::new().fallback(move || {
            let stub = shared.clone();
            async move {
                stub.hits.fetch_add(1, Ordering::SeqCst);
                let (status, body) = stub
                    .replies
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or((500, "{}"));
                (AxumStatus::from_u16(status).unwrap(), body)
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let http = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let client = LlmClient::with_http_client(http, "test-key".to_string())
            .with_base_url(&format!("http://{addr}/v1beta/models/"))
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            });
        (client, stub)
    }

    fn hits(stub: &Stub) -> usize {
        stub.hits.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::FORBIDDEN));
        assert!(!is_retryable(StatusCode::OK));
    }

    #[test]
    fn test_default_policy_is_three_attempts_with_doubling_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_before(0), None);
        assert_eq!(policy.delay_before(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_before(2), Some(Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sleeps_are_cumulative() {
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();
        for attempt in 0..policy.max_attempts {
            if let Some(delay) = policy.delay_before(attempt) {
                tokio::time::sleep(delay).await;
            }
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "slept only {elapsed:?}");
        assert!(elapsed < Duration::from_millis(3010), "slept {elapsed:?}");
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_until_success() {
        let (client, stub) = stub_client(vec![(429, "quota"), (200, OK_BODY)]).await;

        let reply = client.generate(None, &[Turn::user("grade")]).await.unwrap();

        assert_eq!(reply, "Estimated Score (0-100): 88");
        assert_eq!(hits(&stub), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried_and_keeps_api_message() {
        let (client, stub) = stub_client(vec![
            (400, r#"{"error": {"code": 400, "message": "API key not valid"}}"#),
            (200, OK_BODY),
        ])
        .await;

        let err = client.call(None, &[Turn::user("grade")]).await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hits(&stub), 1);
    }

    #[tokio::test]
    async fn test_server_errors_stop_at_attempt_cap() {
        let (client, stub) = stub_client(vec![
            (503, "unavailable"),
            (503, "unavailable"),
            (503, "unavailable"),
            (200, OK_BODY),
        ])
        .await;

        let err = client.call(None, &[Turn::user("grade")]).await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(hits(&stub), 3);
    }

    #[tokio::test]
    async fn test_success_without_text_is_empty_content() {
        let (client, _stub) = stub_client(vec![(200, r#"{"candidates": []}"#)]).await;
        let err = client.generate(None, &[Turn::user("grade")]).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }
}
