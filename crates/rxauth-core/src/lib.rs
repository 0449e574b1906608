//! rxauth Core Library
//!
//! Orchestrates prior-authorization decisions as a sequential multi-phase
//! workflow: coverage verification → policy retrieval → LLM clinical
//! eligibility → PA form generation, with partial-failure degradation and
//! a deterministic final recommendation.
//!
//! Capabilities (stores, policy index, language model) are injected as
//! `Arc<dyn Trait>` handles constructed once at startup; the core holds no
//! global state and no in-process locks.

pub mod coverage;
pub mod eligibility;
pub mod error;
pub mod form;
pub mod prompts;
pub mod retrieval;
pub mod telemetry;
pub mod workflow;

pub use coverage::{CoverageOutcome, CoverageResolver, InsuranceInfo};
pub use eligibility::{
    EligibilityReasoner, EligibilityVerdict, LlmCallMeta, VerdictRecommendation,
};
pub use error::{PaError, Result};
pub use form::{write_form_artifact, FormAssembler, PaFormRecord};
pub use retrieval::PolicyRetriever;
pub use telemetry::init_tracing;
pub use workflow::{
    CoveragePhase, EligibilityPhase, FormPhase, PhaseStatus, PolicySearchPhase, Recommendation,
    WorkflowOrchestrator, WorkflowPhases, WorkflowResult, WorkflowState, WorkflowStatus,
};

pub use rxauth_stores::{
    CoverageRecord, CoverageStore, Diagnosis, LabResults, Patient, PatientStore, PolicyChunk,
    PolicyDocument, PolicyIndex, PolicyMetadata, TreatmentHistory, ValidationError,
};

pub use rxauth_llm::{LanguageModel, LlmError, LlmProvider};

/// rxauth version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
