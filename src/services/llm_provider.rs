use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    /// `POST {endpoint}/chat/completions` with bearer auth.
    OpenAi,
    /// `POST {endpoint}/models/{model}:generateContent?key=...`.
    Gemini,
}

impl ApiFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-compatible" => Some(Self::OpenAi),
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub format: ApiFormat,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl LLMConfig {
    pub fn from_env() -> Self {
        let format = env_string("LLM_API_FORMAT")
            .and_then(|v| ApiFormat::parse(&v))
            .unwrap_or(ApiFormat::OpenAi);
        let (default_model, default_endpoint) = match format {
            ApiFormat::OpenAi => (DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_ENDPOINT),
            ApiFormat::Gemini => (DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_ENDPOINT),
        };

        Self {
            api_key: env_string("LLM_API_KEY"),
            model: env_string("LLM_MODEL").unwrap_or_else(|| default_model.to_string()),
            api_endpoint: env_string("LLM_API_ENDPOINT")
                .or_else(|| env_string("LLM_BASE_URL"))
                .unwrap_or_else(|| default_endpoint.to_string()),
            format,
            timeout: Duration::from_millis(env_u64("LLM_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS)),
            max_attempts: env_u64("LLM_MAX_ATTEMPTS")
                .map(|v| v.clamp(1, 10) as u32)
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            initial_backoff: Duration::from_millis(
                env_u64("LLM_BACKOFF_MS").unwrap_or(DEFAULT_BACKOFF_MS),
            ),
        }
    }

    pub fn openai(api_endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_endpoint: api_endpoint.into(),
            format: ApiFormat::OpenAi,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }

    pub fn gemini(api_endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            format: ApiFormat::Gemini,
            ..Self::openai(api_endpoint, api_key)
        }
    }

    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A single prompt for the upstream model.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub json_mode: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("LLM not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyChoices,
    #[error("upstream failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<LLMError> },
}

/// Text-generation seam the judge talks to.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LLMError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub model: Option<String>,
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Clone)]
pub struct LLMProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl LLMProvider {
    pub fn from_env() -> Self {
        Self::new(LLMConfig::from_env())
    }

    pub fn new(mut config: LLMConfig) -> Self {
        config.api_endpoint = normalize_endpoint(&config.api_endpoint, config.format);
        config.max_attempts = config.max_attempts.max(1);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    pub fn is_available(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|v| !v.trim().is_empty())
            && !self.config.model.trim().is_empty()
            && !self.config.api_endpoint.trim().is_empty()
    }

    async fn generate_with_retry(&self, request: &GenerationRequest) -> Result<String, LLMError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(LLMError::NotConfigured("LLM_API_KEY"))?;

        let max_attempts = self.config.max_attempts;
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.send_once(api_key, request).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < max_attempts => {
                    warn!(attempt, max_attempts, error = %err, ?backoff, "LLM request failed, retrying");
                    sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(LLMError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    })
                }
            }
        }
    }

    async fn send_once(&self, api_key: &str, request: &GenerationRequest) -> Result<String, LLMError> {
        let builder = match self.config.format {
            ApiFormat::OpenAi => {
                let url = format!("{}/chat/completions", self.config.api_endpoint);
                self.client
                    .post(url)
                    .bearer_auth(api_key)
                    .json(&openai_payload(&self.config.model, request))
            }
            ApiFormat::Gemini => {
                let url = format!(
                    "{}/models/{}:generateContent",
                    self.config.api_endpoint, self.config.model
                );
                self.client
                    .post(url)
                    .query(&[("key", api_key)])
                    .json(&gemini_payload(request))
            }
        };

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LLMError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let text = match self.config.format {
            ApiFormat::OpenAi => {
                let parsed: ChatResponse = serde_json::from_slice(&bytes)?;
                parsed.first_content().map(str::to_string)
            }
            ApiFormat::Gemini => {
                let parsed: GeminiResponse = serde_json::from_slice(&bytes)?;
                parsed
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content.parts.into_iter().next())
                    .map(|p| p.text)
            }
        };

        text.ok_or(LLMError::EmptyChoices)
    }
}

#[async_trait]
impl TextGenerator for LLMProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LLMError> {
        self.generate_with_retry(request).await
    }
}

fn openai_payload(model: &str, request: &GenerationRequest) -> serde_json::Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system.as_deref() {
        messages.push(ChatMessage {
            role: "system".into(),
            content: system.into(),
        });
    }
    messages.push(ChatMessage {
        role: "user".into(),
        content: request.prompt.clone(),
    });

    let mut payload = serde_json::json!({
        "model": model,
        "messages": messages,
        "stream": false
    });
    if request.json_mode {
        payload["response_format"] = serde_json::json!({ "type": "json_object" });
    }
    payload
}

fn gemini_payload(request: &GenerationRequest) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "contents": [{ "parts": [{ "text": request.prompt }] }]
    });
    if let Some(system) = request.system.as_deref() {
        payload["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
    }
    if request.json_mode {
        payload["generationConfig"] = serde_json::json!({ "responseMimeType": "application/json" });
    }
    payload
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

fn normalize_endpoint(endpoint: &str, format: ApiFormat) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    match format {
        ApiFormat::Gemini => trimmed.to_string(),
        ApiFormat::OpenAi if trimmed.ends_with("/v1") || trimmed.contains("/v1/") => {
            trimmed.to_string()
        }
        ApiFormat::OpenAi => format!("{trimmed}/v1"),
    }
}
