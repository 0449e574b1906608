//! Provider clients for OpenAI-compatible chat completion endpoints.
//!
//! Two implementations of [`LanguageModel`]:
//! - `CerebrasClient` — primary provider (api.cerebras.ai)
//! - `OpenRouterClient` — fallback provider (openrouter.ai)
//!
//! Both speak the same chat-completions wire format and share one request
//! path with bounded retry: 3 attempts, exponential backoff starting at 2s
//! and capped at 10s, retrying only transport failures, 429s, and 5xx
//! responses. Client-side rejections (other 4xx) and empty replies fail
//! fast.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LlmError, LlmResult};
use crate::pricing::cost_for;
use crate::types::{ChatMessage, CompletionRequest, CompletionResponse, TokenUsage};
use crate::LanguageModel;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_SECS: u64 = 2;
const BACKOFF_CAP_SECS: u64 = 10;

/// Connection settings for one provider endpoint.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Cerebras settings from `CEREBRAS_API_KEY` / `CEREBRAS_MODEL` /
    /// `CEREBRAS_BASE_URL`.
    pub fn cerebras_from_env() -> Self {
        ProviderConfig {
            api_key: std::env::var("CEREBRAS_API_KEY").unwrap_or_default(),
            model: std::env::var("CEREBRAS_MODEL").unwrap_or_else(|_| "gpt-oss-120b".to_string()),
            base_url: std::env::var("CEREBRAS_BASE_URL")
                .unwrap_or_else(|_| "https://api.cerebras.ai/v1".to_string()),
            timeout_secs: llm_timeout_from_env(),
        }
    }

    /// OpenRouter settings from `OPENROUTER_API_KEY` / `OPENROUTER_MODEL` /
    /// `OPENROUTER_BASE_URL`.
    pub fn openrouter_from_env() -> Self {
        ProviderConfig {
            api_key: std::env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            model: std::env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4o".to_string()),
            base_url: std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            timeout_secs: llm_timeout_from_env(),
        }
    }
}

fn llm_timeout_from_env() -> u64 {
    std::env::var("LLM_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30)
}

// ---------------------------------------------------------------------------
// Wire types (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatCompletionReply {
    choices: Vec<ReplyChoice>,
    usage: Option<ReplyUsage>,
}

#[derive(Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ReplyUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ---------------------------------------------------------------------------
// Shared request path
// ---------------------------------------------------------------------------

struct ChatEndpoint {
    provider: &'static str,
    config: ProviderConfig,
    http: reqwest::Client,
}

impl ChatEndpoint {
    fn new(provider: &'static str, config: ProviderConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rxauth/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        if config.api_key.is_empty() {
            warn!(provider = provider, "API key not configured");
        }

        ChatEndpoint {
            provider,
            config,
            http,
        }
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey {
                provider: self.provider,
            });
        }

        let started = Instant::now();
        let reply = self.send_with_retry(&request).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let content = reply
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        let tokens_used = match reply.usage {
            Some(usage) => TokenUsage {
                input: usage.prompt_tokens,
                output: usage.completion_tokens,
                total: usage.total_tokens,
            },
            None => TokenUsage::default(),
        };

        let cost = cost_for(&self.config.model, tokens_used.input, tokens_used.output);

        info!(
            provider = self.provider,
            model = %self.config.model,
            total_tokens = tokens_used.total,
            latency_ms = latency_ms,
            cost = cost,
            "LLM call successful"
        );

        Ok(CompletionResponse {
            content,
            model: self.config.model.clone(),
            latency_ms,
            tokens_used,
            cost,
        })
    }

    async fn send_with_retry(&self, request: &CompletionRequest) -> LlmResult<ChatCompletionReply> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = ChatCompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.response_format.as_ref(),
        };

        let mut last_err = LlmError::EmptyResponse;

        for attempt in 1..=MAX_ATTEMPTS {
            let result = self
                .http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
                .await;

            match result {
                Err(err) => {
                    last_err = LlmError::Transport {
                        provider: self.provider,
                        message: err.to_string(),
                    };
                }
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<ChatCompletionReply>().await.map_err(|err| {
                            LlmError::Transport {
                                provider: self.provider,
                                message: format!("malformed completion body: {err}"),
                            }
                        });
                    }

                    let message = response.text().await.unwrap_or_default();
                    let api_err = LlmError::Api {
                        provider: self.provider,
                        status: status.as_u16(),
                        message,
                    };

                    // Only rate limits and server errors are transient.
                    if !(status.as_u16() == 429 || status.is_server_error()) {
                        return Err(api_err);
                    }
                    last_err = api_err;
                }
            }

            if attempt < MAX_ATTEMPTS {
                let wait = backoff_delay(attempt);
                warn!(
                    provider = self.provider,
                    attempt = attempt,
                    wait_secs = wait.as_secs(),
                    error = %last_err,
                    "LLM call failed, retrying"
                );
                tokio::time::sleep(wait).await;
            }
        }

        Err(last_err)
    }
}

/// Exponential backoff: 2s, 4s, 8s, ... capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let secs = BACKOFF_BASE_SECS.saturating_mul(1u64 << (attempt - 1));
    Duration::from_secs(secs.min(BACKOFF_CAP_SECS))
}

// ---------------------------------------------------------------------------
// CerebrasClient
// ---------------------------------------------------------------------------

/// Cerebras chat completion client (primary provider).
pub struct CerebrasClient {
    endpoint: ChatEndpoint,
}

impl CerebrasClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            endpoint: ChatEndpoint::new("cerebras", config),
        }
    }

    pub fn from_env() -> Self {
        Self::new(ProviderConfig::cerebras_from_env())
    }
}

#[async_trait]
impl LanguageModel for CerebrasClient {
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        self.endpoint.complete(request).await
    }

    fn model_name(&self) -> &str {
        &self.endpoint.config.model
    }
}

// ---------------------------------------------------------------------------
// OpenRouterClient
// ---------------------------------------------------------------------------

/// OpenRouter chat completion client (fallback provider).
pub struct OpenRouterClient {
    endpoint: ChatEndpoint,
}

impl OpenRouterClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            endpoint: ChatEndpoint::new("openrouter", config),
        }
    }

    pub fn from_env() -> Self {
        Self::new(ProviderConfig::openrouter_from_env())
    }
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        self.endpoint.complete(request).await
    }

    fn model_name(&self) -> &str {
        &self.endpoint.config.model
    }
}
