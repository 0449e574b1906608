//! Domain-level error taxonomy for the workflow core.

use rxauth_llm::LlmError;
use rxauth_stores::{StoreError, ValidationError};

/// Errors produced by the prior-authorization core.
///
/// Only `PatientNotFound` (on form generation and workflow start) aborts a
/// workflow outright; inside the orchestrator every other variant degrades
/// to a phase-local error status and the workflow still reaches a
/// recommendation.
#[derive(Debug, thiserror::Error)]
pub enum PaError {
    #[error("patient not found: {0}")]
    PatientNotFound(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("language model error: {0}")]
    Llm(#[from] LlmError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, PaError>;
