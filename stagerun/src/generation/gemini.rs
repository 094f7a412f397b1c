//! HTTP client for the hosted Gemini `generateContent` endpoint.

use super::{GenerationError, GenerationRequest, TextGenerator};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Connection settings for [`GeminiClient`].
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key. Never written back out when serialising.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Base URL of the REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl GeminiConfig {
    /// Creates a configuration with the given key and default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Reads the API key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env() -> Result<Self, GenerationError> {
        api_key_from_env().map(Self::new).ok_or_else(|| {
            GenerationError::Config(format!("none of {} is set", API_KEY_VARS.join(", ")))
        })
    }

    /// Loads settings from a JSON file.
    ///
    /// A missing or empty `api_key` in the file is filled from the environment.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        if config.api_key.is_empty() {
            config.api_key = api_key_from_env().unwrap_or_default();
        }
        Ok(config)
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty())
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// A [`TextGenerator`] backed by the hosted Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    user_agent: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Builds a client from its configuration.
    pub fn new(config: &GeminiConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Config("API key is empty".to_string()));
        }
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GenerationError::Config("Base URL cannot be empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GenerationError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            user_agent: format!("stagerun/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let body = GenerateContentRequest::from_request(&request);
        let url = self.endpoint(&request.config.model);
        debug!(model = %request.config.model, "Calling generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK {
            let parsed = response
                .json::<GenerateContentResponse>()
                .await
                .map_err(|e| GenerationError::Transport(format!("invalid response body: {e}")))?;
            return extract_text(parsed);
        }

        let text = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "generateContent request failed");
        Err(classify_failure(status, &text))
    }
}

fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    match status {
        StatusCode::TOO_MANY_REQUESTS => GenerationError::Quota(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth(body),
        StatusCode::BAD_REQUEST if body.contains("API_KEY_INVALID") => GenerationError::Auth(body),
        status => GenerationError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::Content(reason));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    if !text.trim().is_empty() {
        return Ok(text);
    }

    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "RECITATION" | "SPII")) => {
            Err(GenerationError::Content(reason.to_string()))
        }
        _ => Err(GenerationError::EmptyResponse),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: WireGenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: WireGenerationConfig {
                temperature: request.config.temperature,
                max_output_tokens: request.config.max_output_tokens,
                thinking_config: ThinkingConfig {
                    thinking_budget: request.config.thinking_budget,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
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
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationConfig;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::io::Write;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let config = GeminiConfig::new("sk-very-secret");
        let client = GeminiClient::new(&config).unwrap();

        for rendered in [format!("{config:?}"), format!("{client:?}")] {
            assert!(!rendered.contains("sk-very-secret"), "{rendered}");
            assert!(rendered.contains("<redacted>"));
        }
        assert!(format!("{:?}", GeminiConfig::new("")).contains("<unset>"));
    }

    #[test]
    fn test_request_wire_format() {
        let request = GenerationRequest::new("hello", GenerationConfig::default());
        let body = serde_json::to_value(GenerateContentRequest::from_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["parts"][0]["text"], json!("hello"));
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], json!(4000));
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts_and_skips_thoughts() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "planning...", "thought": true},
                    {"text": "CATEGORIZATION:\n"},
                    {"text": "COMP-001 -> Billing"}
                ]},
                "finishReason": "STOP"
            }]
        }));

        assert_eq!(extract_text(response).unwrap(), "CATEGORIZATION:\nCOMP-001 -> Billing");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response = parse(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        assert_eq!(
            extract_text(response),
            Err(GenerationError::Content("SAFETY".to_string()))
        );
    }

    #[test]
    fn test_extract_text_empty() {
        assert_eq!(extract_text(parse(json!({}))), Err(GenerationError::EmptyResponse));

        let response = parse(json!({"candidates": [{"finishReason": "MAX_TOKENS"}]}));
        assert_eq!(extract_text(response), Err(GenerationError::EmptyResponse));

        let response = parse(json!({"candidates": [{"finishReason": "RECITATION"}]}));
        assert!(matches!(extract_text(response), Err(GenerationError::Content(_))));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            GenerationError::Quota(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, ""),
            GenerationError::Auth(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, r#"{"reason":"API_KEY_INVALID"}"#),
            GenerationError::Auth(_)
        ));
        assert_eq!(
            classify_failure(StatusCode::BAD_GATEWAY, "upstream"),
            GenerationError::Http { status: 502, body: "upstream".to_string() }
        );
    }

    #[test]
    fn test_client_requires_api_key() {
        let err = GeminiClient::new(&GeminiConfig::new("  ")).unwrap_err();
        assert!(matches!(err, GenerationError::Config(_)));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"api_key": "from-file", "timeout_secs": 5}}"#).unwrap();

        let config = GeminiConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_key, "from-file");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.base_url, default_base_url());
    }

    #[test]
    fn test_config_never_serializes_key() {
        let json = serde_json::to_value(GeminiConfig::new("secret")).unwrap();
        assert!(json.get("api_key").is_none());
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-3-pro-preview:generateContent")
                    .header("x-goog-api-key", "test-key")
                    .body_contains("\"thinkingBudget\":4000");
                then.status(200).json_body(json!({
                    "candidates": [{"content": {"parts": [{"text": "OK"}]}}]
                }));
            })
            .await;

        let client =
            GeminiClient::new(&GeminiConfig::new("test-key").with_base_url(server.base_url()))
                .unwrap();
        let text = client
            .generate(GenerationRequest::new("ping", GenerationConfig::default()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "OK");
    }

    #[tokio::test]
    async fn test_generate_maps_rate_limit_to_quota() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(429).body("quota exceeded for project");
            })
            .await;

        let client =
            GeminiClient::new(&GeminiConfig::new("test-key").with_base_url(server.base_url()))
                .unwrap();
        let err = client
            .generate(GenerationRequest::new("ping", GenerationConfig::default()))
            .await
            .unwrap_err();

        assert_eq!(err, GenerationError::Quota("quota exceeded for project".to_string()));
    }
}
