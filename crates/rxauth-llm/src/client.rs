//! The `LanguageModel` capability trait and provider selection.
//!
//! One trait, one operation. The closed set of provider implementations
//! lives in `providers`; which one runs is decided by configuration at
//! process startup, never by string dispatch inside the workflow core.
//! Callers construct the client once and pass it around as
//! `Arc<dyn LanguageModel>`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{LlmError, LlmResult};
use crate::providers::{CerebrasClient, OpenRouterClient};
use crate::types::{CompletionRequest, CompletionResponse};

/// A language model endpoint.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one chat completion. Transient transport failures are retried
    /// inside the implementation (bounded, with backoff); what comes back
    /// is either a usable response or a typed error.
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse>;

    /// The configured model identifier, for logging and cost accounting.
    fn model_name(&self) -> &str;
}

/// Supported providers. Cerebras is primary, OpenRouter is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Cerebras,
    OpenRouter,
}

impl FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cerebras" => Ok(LlmProvider::Cerebras),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

/// Build the configured provider client from environment variables.
///
/// Called once at startup; the returned handle is shared by reference.
/// Switching providers means building a new client, not mutating this one.
pub fn build_model(provider: LlmProvider) -> Arc<dyn LanguageModel> {
    match provider {
        LlmProvider::Cerebras => Arc::new(CerebrasClient::from_env()),
        LlmProvider::OpenRouter => Arc::new(OpenRouterClient::from_env()),
    }
}

/// Build the provider selected by the `LLM_PROVIDER` environment variable
/// (default: cerebras).
pub fn build_model_from_env() -> LlmResult<Arc<dyn LanguageModel>> {
    let name = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "cerebras".to_string());
    Ok(build_model(name.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("cerebras".parse::<LlmProvider>().unwrap(), LlmProvider::Cerebras);
        assert_eq!("OpenRouter".parse::<LlmProvider>().unwrap(), LlmProvider::OpenRouter);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = "gpt4all".parse::<LlmProvider>().unwrap_err();
        assert!(err.to_string().contains("unknown LLM provider"));
    }
}
