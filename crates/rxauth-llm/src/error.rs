//! Error types for rxauth-llm

use thiserror::Error;

/// Failures from the language model layer.
///
/// Transport/API failures are distinct from an empty or unparseable
/// response: callers retry the former (bounded, in the provider client)
/// and surface the latter immediately.
#[derive(Error, Debug)]
pub enum LlmError {
    /// API key not configured for the selected provider
    #[error("API key not configured for provider '{provider}'")]
    MissingApiKey { provider: &'static str },

    /// Network-level failure reaching the provider
    #[error("transport error calling {provider}: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    /// Provider rejected the request or failed server-side
    #[error("{provider} API error (status {status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Provider returned a well-formed reply with no usable content
    #[error("model returned an empty response")]
    EmptyResponse,

    /// Model reply was not valid JSON after fence unwrapping.
    /// Carries the raw response text for diagnosis.
    #[error("invalid JSON in model response: {raw}")]
    ResponseParse { raw: String },

    /// Provider name not in the supported set
    #[error("unknown LLM provider: {0} (supported: 'cerebras', 'openrouter')")]
    UnknownProvider(String),
}

/// Result type for language model operations
pub type LlmResult<T> = std::result::Result<T, LlmError>;
