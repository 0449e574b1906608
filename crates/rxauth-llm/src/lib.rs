//! rxauth-llm: language model clients and instrumentation (Layer 1)
//!
//! Exposes one capability trait, [`LanguageModel`], with one operation
//! (`complete`), a closed set of provider implementations selected by
//! configuration at startup, and the supporting pieces the workflow core
//! needs:
//!
//! - bounded retry with exponential backoff inside the provider clients
//! - fenced-JSON unwrapping for structured replies
//! - per-model cost accounting
//! - a single instrumentation seam ([`InstrumentedModel`])
//! - scripted fakes for tests

pub mod client;
pub mod error;
pub mod fakes;
pub mod instrument;
pub mod json;
pub mod pricing;
pub mod providers;
pub mod types;

pub use client::{build_model, build_model_from_env, LanguageModel, LlmProvider};
pub use error::{LlmError, LlmResult};
pub use instrument::InstrumentedModel;
pub use json::{parse_json_response, strip_code_fence};
pub use pricing::cost_for;
pub use providers::{CerebrasClient, OpenRouterClient, ProviderConfig};
pub use types::{ChatMessage, CompletionRequest, CompletionResponse, Role, TokenUsage};
