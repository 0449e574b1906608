//! Telemetry interceptor for the `LanguageModel` trait.
//!
//! Instrumentation is one seam: wrap any model in [`InstrumentedModel`]
//! and every call gets a per-call id plus structured tracing events for
//! latency, tokens, cost, and outcome. Phase code never logs model calls
//! itself.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::LlmResult;
use crate::types::{CompletionRequest, CompletionResponse};
use crate::LanguageModel;

/// Decorator emitting telemetry around an inner model.
pub struct InstrumentedModel {
    inner: Arc<dyn LanguageModel>,
}

impl InstrumentedModel {
    pub fn new(inner: Arc<dyn LanguageModel>) -> Self {
        Self { inner }
    }

    /// Wrap a model, returning it as a shared trait object.
    pub fn wrap(inner: Arc<dyn LanguageModel>) -> Arc<dyn LanguageModel> {
        Arc::new(Self::new(inner))
    }
}

#[async_trait]
impl LanguageModel for InstrumentedModel {
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let call_id = Uuid::new_v4();
        let started = Instant::now();

        debug!(
            call_id = %call_id,
            model = self.inner.model_name(),
            messages = request.messages.len(),
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "LLM call started"
        );

        match self.inner.complete(request).await {
            Ok(response) => {
                info!(
                    call_id = %call_id,
                    model = %response.model,
                    latency_ms = response.latency_ms,
                    total_tokens = response.tokens_used.total,
                    cost = response.cost,
                    "LLM call completed"
                );
                Ok(response)
            }
            Err(err) => {
                warn!(
                    call_id = %call_id,
                    model = self.inner.model_name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "LLM call failed"
                );
                Err(err)
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
