//! Clinical eligibility reasoning with retrieval-augmented LLM calls.
//!
//! Builds a structured prompt from patient data plus retrieved policy
//! context, invokes the language model at low temperature, and parses a
//! strict-JSON verdict. Parse failures carry the raw model text; no
//! heuristic recovery is attempted beyond a single fence unwrap.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use rxauth_llm::{
    parse_json_response, ChatMessage, CompletionRequest, LanguageModel, TokenUsage,
};
use rxauth_stores::{Diagnosis, Patient, PolicyChunk, PolicyIndex, TreatmentHistory};

use crate::error::Result;
use crate::prompts::{self, EligibilityPromptInputs};

/// Sampling settings tuned for consistent determinations.
const ELIGIBILITY_TEMPERATURE: f64 = 0.1;
const ELIGIBILITY_MAX_TOKENS: u32 = 1000;

/// Chunks retrieved per evaluation and the per-chunk context truncation.
const RAG_TOP_K: usize = 3;
const CONTEXT_CHARS: usize = 300;

/// Model recommendation inside a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictRecommendation {
    Approve,
    Deny,
    NeedsReview,
}

impl VerdictRecommendation {
    /// Map the model's string field. Anything unrecognized is conservative:
    /// it needs human review.
    pub fn from_label(label: &str) -> Self {
        match label {
            "APPROVE" => VerdictRecommendation::Approve,
            "DENY" => VerdictRecommendation::Deny,
            _ => VerdictRecommendation::NeedsReview,
        }
    }
}

impl std::fmt::Display for VerdictRecommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VerdictRecommendation::Approve => "APPROVE",
            VerdictRecommendation::Deny => "DENY",
            VerdictRecommendation::NeedsReview => "NEEDS_REVIEW",
        };
        write!(f, "{label}")
    }
}

/// Metadata about the model call that produced a verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmCallMeta {
    pub model: String,
    pub latency_ms: u64,
    pub tokens_used: TokenUsage,
    pub cost: f64,
}

/// A clinical eligibility determination. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub meets_criteria: bool,
    /// Clamped to [0, 1].
    pub confidence_score: f64,
    pub clinical_justification: String,
    pub recommendation: VerdictRecommendation,
    /// Full parsed model payload, for audit.
    pub reasoning: serde_json::Value,
    pub llm: LlmCallMeta,
}

impl EligibilityVerdict {
    /// The verdict standing in when no evaluation succeeded: does not meet
    /// criteria, zero confidence, needs review.
    pub fn unreviewed() -> Self {
        EligibilityVerdict {
            meets_criteria: false,
            confidence_score: 0.0,
            clinical_justification: String::new(),
            recommendation: VerdictRecommendation::NeedsReview,
            reasoning: serde_json::Value::Null,
            llm: LlmCallMeta::default(),
        }
    }
}

/// Evaluates clinical eligibility via the language model, optionally
/// augmented with retrieved policy context.
pub struct EligibilityReasoner {
    model: Arc<dyn LanguageModel>,
    policies: Arc<dyn PolicyIndex>,
}

impl EligibilityReasoner {
    pub fn new(model: Arc<dyn LanguageModel>, policies: Arc<dyn PolicyIndex>) -> Self {
        Self { model, policies }
    }

    /// Evaluate whether `patient` meets the criteria for `drug`.
    ///
    /// The patient record is read, never mutated; the only side effect is
    /// the outbound model call.
    pub async fn evaluate(
        &self,
        patient: &Patient,
        drug: &str,
        policy_criteria: &str,
        use_rag: bool,
    ) -> Result<EligibilityVerdict> {
        info!(
            patient_id = %patient.patient_id,
            drug = drug,
            use_rag = use_rag,
            "Checking clinical eligibility"
        );

        let diagnoses = format_diagnoses(&patient.diagnoses);
        let treatment_history = format_treatment_history(&patient.treatment_history);

        let mut policy_context = String::new();
        if use_rag {
            let query = format!("{drug} {diagnoses} treatment criteria requirements");
            let chunks = self.policies.search(&query, RAG_TOP_K, 0.0).await?;
            if !chunks.is_empty() {
                info!(chunks = chunks.len(), "Retrieved policy context");
                policy_context = format_policy_context(&chunks);
            }
        }

        let prompt = prompts::eligibility_prompt(&EligibilityPromptInputs {
            policy_context: &policy_context,
            policy_criteria,
            patient_id: &patient.patient_id,
            age: patient.age,
            gender: &patient.gender,
            diagnoses: &diagnoses,
            hba1c: patient.labs.hba1c.unwrap_or(0.0),
            bmi: patient.labs.bmi.unwrap_or(0.0),
            weight_lbs: patient.labs.weight_lbs.unwrap_or(0.0),
            creatinine: patient.labs.creatinine.unwrap_or(0.0),
            egfr: patient.labs.egfr.unwrap_or(0),
            treatment_history: &treatment_history,
            drug,
        });

        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(prompts::ELIGIBILITY_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            ELIGIBILITY_TEMPERATURE,
            ELIGIBILITY_MAX_TOKENS,
        );

        let response = self.model.complete(request).await?;
        let parsed = parse_json_response(&response.content)?;

        // Explicit defaults: a parseable-but-incomplete reply can never
        // yield missing required fields.
        let verdict = EligibilityVerdict {
            meets_criteria: parsed
                .get("meets_criteria")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            confidence_score: parsed
                .get("confidence_score")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(0.0)
                .clamp(0.0, 1.0),
            clinical_justification: parsed
                .get("clinical_justification")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
            recommendation: parsed
                .get("recommendation")
                .and_then(serde_json::Value::as_str)
                .map(VerdictRecommendation::from_label)
                .unwrap_or(VerdictRecommendation::NeedsReview),
            reasoning: parsed,
            llm: LlmCallMeta {
                model: response.model,
                latency_ms: response.latency_ms,
                tokens_used: response.tokens_used,
                cost: response.cost,
            },
        };

        info!(
            recommendation = %verdict.recommendation,
            confidence = verdict.confidence_score,
            "Eligibility check complete"
        );
        Ok(verdict)
    }
}

/// `"name (icd10)"` comma-joined, or a fallback line for empty lists.
pub fn format_diagnoses(diagnoses: &[Diagnosis]) -> String {
    if diagnoses.is_empty() {
        return "No diagnoses recorded".to_string();
    }
    diagnoses
        .iter()
        .map(|d| format!("{} ({})", d.name, d.icd10))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Numbered treatment list, or a fallback line for empty histories.
pub fn format_treatment_history(history: &[TreatmentHistory]) -> String {
    if history.is_empty() {
        return "No prior treatment history available".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{}. {}: {} months, outcome: {}",
                i + 1,
                t.drug,
                t.duration_months,
                t.outcome
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bounded context block: each chunk truncated to 300 chars and annotated
/// with its plan/drug metadata and percentage similarity.
fn format_policy_context(chunks: &[PolicyChunk]) -> String {
    let mut lines = vec!["Retrieved Policy Context:".to_string()];
    for (i, chunk) in chunks.iter().enumerate() {
        let text: String = chunk.text.chars().take(CONTEXT_CHARS).collect();
        let plan = chunk.metadata.plan.as_deref().unwrap_or("Unknown");
        let drug = chunk.metadata.drug.as_deref().unwrap_or("Unknown");
        lines.push(format!(
            "\n[Context {} - {}/{} ({:.2}% match)]",
            i + 1,
            plan,
            drug,
            chunk.similarity * 100.0
        ));
        lines.push(format!("{text}..."));
    }
    lines.join("\n")
}
