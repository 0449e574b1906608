//! In-memory fakes for the `LanguageModel` trait (testing only)
//!
//! `ScriptedModel` replays a queue of canned replies; `FailingModel`
//! always errors. Both let orchestrator and reasoner tests run without a
//! network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{LlmError, LlmResult};
use crate::types::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::LanguageModel;

/// Replays canned responses in order; errors with `EmptyResponse` when the
/// script runs out.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
        }
    }

    /// A script with one reply.
    pub fn single(response: &str) -> Self {
        Self::new(vec![response])
    }

    /// A script replaying the same reply `count` times.
    pub fn repeating(response: &str, count: usize) -> Self {
        Self::new(vec![response; count])
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse)?;

        // Rough token estimate so cost/usage fields are populated the way
        // a real provider would populate them.
        let input: u32 = request
            .messages
            .iter()
            .map(|m| m.content.len() as u32 / 4)
            .sum();
        let output = content.len() as u32 / 4;

        Ok(CompletionResponse {
            content,
            model: "scripted-model".to_string(),
            latency_ms: 0,
            tokens_used: TokenUsage {
                input,
                output,
                total: input + output,
            },
            cost: 0.0,
        })
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// Always fails with a transport error. For exercising degraded phases.
pub struct FailingModel {
    message: String,
}

impl FailingModel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingModel {
    fn default() -> Self {
        Self::new("model endpoint unreachable")
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _request: CompletionRequest) -> LlmResult<CompletionResponse> {
        Err(LlmError::Transport {
            provider: "fake",
            message: self.message.clone(),
        })
    }

    fn model_name(&self) -> &str {
        "failing-model"
    }
}
