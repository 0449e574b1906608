//! End-to-end prescription workflow orchestration.
//!
//! Chains coverage verification, policy search, clinical eligibility, and
//! PA form generation into one sequential pipeline. Each phase's output is
//! a hard input dependency for the next; phase failures after coverage
//! degrade to a phase-local error status so the workflow still reaches a
//! recommendation. Only a failed patient lookup aborts the run.
//!
//! State machine:
//! `STARTED → COVERAGE_CHECKED → (NOT_COVERED) | POLICY_SEARCHED →
//! ELIGIBILITY_CHECKED → FORM_GENERATED → COMPLETED`, with `ERRORED` as
//! the abort terminal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use rxauth_llm::LanguageModel;
use rxauth_stores::{CoverageStore, Patient, PatientStore, PolicyChunk, PolicyIndex};

use crate::coverage::{CoverageOutcome, CoverageResolver};
use crate::eligibility::{EligibilityReasoner, EligibilityVerdict};
use crate::form::{FormAssembler, PaFormRecord};
use crate::retrieval::PolicyRetriever;

/// Chunks considered for criteria extraction and policy search.
const POLICY_TOP_K: usize = 3;

/// Fallback criteria when retrieval yields nothing usable.
const DEFAULT_CRITERIA: &str = "Standard medical necessity criteria";

/// Workflow states. The result records the terminal state reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    Started,
    CoverageChecked,
    NotCovered,
    PolicySearched,
    EligibilityChecked,
    FormGenerated,
    Completed,
    Errored,
}

/// Overall workflow recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Approve,
    Deny,
    Review,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Recommendation::Approve => "APPROVE",
            Recommendation::Deny => "DENY",
            Recommendation::Review => "REVIEW",
        };
        write!(f, "{label}")
    }
}

/// Per-phase completion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Success,
    Error,
}

/// Coverage verification phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveragePhase {
    pub outcome: CoverageOutcome,
    pub status: PhaseStatus,
    pub error: Option<String>,
}

/// Policy search phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySearchPhase {
    pub drug: String,
    pub policies_found: usize,
    pub results: Vec<PolicyChunk>,
    pub status: PhaseStatus,
    pub error: Option<String>,
}

/// Clinical eligibility phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityPhase {
    pub verdict: EligibilityVerdict,
    pub status: PhaseStatus,
    pub error: Option<String>,
}

/// PA form generation phase output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormPhase {
    pub form_id: Option<String>,
    pub has_clinical_narrative: bool,
    pub narrative_preview: Option<String>,
    pub form: Option<PaFormRecord>,
    pub status: PhaseStatus,
    pub error: Option<String>,
}

/// Per-phase outputs. `None` marks a phase that never ran — skips are
/// explicit in the serialized result, never silent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPhases {
    pub coverage: Option<CoveragePhase>,
    pub policy_search: Option<PolicySearchPhase>,
    pub eligibility: Option<EligibilityPhase>,
    pub pa_form: Option<FormPhase>,
}

/// Patient identity snapshot on the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    pub insurance_plan: String,
}

/// Overall workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Completed,
    Error,
}

/// The unit of output from one orchestration run. Created fresh per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub status: WorkflowStatus,
    pub state: WorkflowState,
    pub timestamp: DateTime<Utc>,
    pub patient: Option<PatientSummary>,
    pub phases: WorkflowPhases,
    pub recommendation: Option<Recommendation>,
    pub summary: Option<String>,
    pub error: Option<String>,
}

/// Orchestrates the complete prescription processing workflow.
///
/// Capabilities are injected once at construction; the orchestrator owns
/// composition but never mutates a phase's output — it only reads fields
/// to decide control flow and to feed the next phase.
pub struct WorkflowOrchestrator {
    patients: Arc<dyn PatientStore>,
    resolver: CoverageResolver,
    retriever: PolicyRetriever,
    reasoner: EligibilityReasoner,
    assembler: FormAssembler,
}

impl WorkflowOrchestrator {
    pub fn new(
        patients: Arc<dyn PatientStore>,
        coverage: Arc<dyn CoverageStore>,
        policies: Arc<dyn PolicyIndex>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            patients: patients.clone(),
            resolver: CoverageResolver::new(patients.clone(), coverage),
            retriever: PolicyRetriever::new(policies.clone()),
            reasoner: EligibilityReasoner::new(model.clone(), policies),
            assembler: FormAssembler::new(patients, model),
        }
    }

    /// Run the end-to-end workflow for one prescription.
    ///
    /// Always returns a result; failures surface as `status: error` or a
    /// degraded phase, never as a propagated error.
    pub async fn process_prescription(
        &self,
        patient_id: &str,
        drug: &str,
        provider_name: &str,
        npi: &str,
    ) -> WorkflowResult {
        let workflow_id = format!(
            "WF_{}_{}_{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            patient_id,
            drug.to_uppercase()
        );
        info!(workflow_id = %workflow_id, "Starting workflow");

        // Fetch the patient once; everything downstream reads this copy.
        let patient = match self.patients.get_patient(patient_id).await {
            Ok(Some(patient)) => patient,
            Ok(None) => {
                return error_result(&workflow_id, format!("Patient {patient_id} not found"))
            }
            Err(err) => {
                error!(workflow_id = %workflow_id, error = %err, "Patient lookup failed");
                return error_result(&workflow_id, err.to_string());
            }
        };
        let patient_summary = PatientSummary {
            patient_id: patient.patient_id.clone(),
            name: patient.name.clone(),
            age: patient.age,
            insurance_plan: patient.insurance_plan.clone(),
        };

        let mut state = WorkflowState::Started;

        info!(workflow_id = %workflow_id, "Phase: coverage verification");
        let coverage = self.coverage_phase(&patient, drug).await;
        state = transition(&workflow_id, state, WorkflowState::CoverageChecked);

        if !coverage.outcome.covered {
            info!(workflow_id = %workflow_id, "Drug not covered, workflow complete");
            let state = transition(&workflow_id, state, WorkflowState::NotCovered);
            let summary = build_summary(&coverage, None, Recommendation::Deny);
            return WorkflowResult {
                workflow_id,
                status: WorkflowStatus::Completed,
                state,
                timestamp: Utc::now(),
                patient: Some(patient_summary),
                phases: WorkflowPhases {
                    coverage: Some(coverage),
                    policy_search: None,
                    eligibility: None,
                    pa_form: None,
                },
                recommendation: Some(Recommendation::Deny),
                summary: Some(summary),
                error: None,
            };
        }

        info!(workflow_id = %workflow_id, "Phase: policy search");
        let policy_search = self.policy_search_phase(drug).await;
        let policy_criteria = extract_policy_criteria(&policy_search);
        state = transition(&workflow_id, state, WorkflowState::PolicySearched);

        info!(workflow_id = %workflow_id, "Phase: clinical eligibility");
        let eligibility = self.eligibility_phase(&patient, drug, &policy_criteria).await;
        state = transition(&workflow_id, state, WorkflowState::EligibilityChecked);

        // Form generation runs whenever coverage passed: a failed
        // eligibility phase still yields a form around the default verdict.
        info!(workflow_id = %workflow_id, "Phase: PA form generation");
        let pa_form = self
            .form_phase(patient_id, drug, &eligibility.verdict, provider_name, npi)
            .await;
        state = transition(&workflow_id, state, WorkflowState::FormGenerated);

        let recommendation = final_recommendation(&coverage, &eligibility);
        let summary = build_summary(&coverage, Some(&eligibility), recommendation);
        let state = transition(&workflow_id, state, WorkflowState::Completed);

        info!(workflow_id = %workflow_id, recommendation = %recommendation, "Workflow complete");
        WorkflowResult {
            workflow_id,
            status: WorkflowStatus::Completed,
            state,
            timestamp: Utc::now(),
            patient: Some(patient_summary),
            phases: WorkflowPhases {
                coverage: Some(coverage),
                policy_search: Some(policy_search),
                eligibility: Some(eligibility),
                pa_form: Some(pa_form),
            },
            recommendation: Some(recommendation),
            summary: Some(summary),
            error: None,
        }
    }

    async fn coverage_phase(&self, patient: &Patient, drug: &str) -> CoveragePhase {
        match self.resolver.resolve_plan(&patient.insurance_plan, drug).await {
            Ok(outcome) => CoveragePhase {
                outcome,
                status: PhaseStatus::Success,
                error: None,
            },
            Err(err) => {
                error!(error = %err, "Coverage phase failed");
                CoveragePhase {
                    outcome: CoverageOutcome::not_covered("Coverage check unavailable"),
                    status: PhaseStatus::Error,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn policy_search_phase(&self, drug: &str) -> PolicySearchPhase {
        match self.retriever.search(drug, POLICY_TOP_K, 0.0).await {
            Ok(results) => PolicySearchPhase {
                drug: drug.to_string(),
                policies_found: results.len(),
                results,
                status: PhaseStatus::Success,
                error: None,
            },
            Err(err) => {
                error!(error = %err, "Policy search phase failed");
                PolicySearchPhase {
                    drug: drug.to_string(),
                    policies_found: 0,
                    results: vec![],
                    status: PhaseStatus::Error,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn eligibility_phase(
        &self,
        patient: &Patient,
        drug: &str,
        policy_criteria: &str,
    ) -> EligibilityPhase {
        match self.reasoner.evaluate(patient, drug, policy_criteria, true).await {
            Ok(verdict) => EligibilityPhase {
                verdict,
                status: PhaseStatus::Success,
                error: None,
            },
            Err(err) => {
                error!(error = %err, "Eligibility phase failed");
                EligibilityPhase {
                    verdict: EligibilityVerdict::unreviewed(),
                    status: PhaseStatus::Error,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn form_phase(
        &self,
        patient_id: &str,
        drug: &str,
        verdict: &EligibilityVerdict,
        provider_name: &str,
        npi: &str,
    ) -> FormPhase {
        match self
            .assembler
            .generate(patient_id, drug, verdict, provider_name, npi)
            .await
        {
            Ok(form) => {
                let narrative = &form.justification.clinical_narrative;
                let preview: String = narrative.chars().take(100).collect();
                FormPhase {
                    form_id: Some(form.header.form_id.clone()),
                    has_clinical_narrative: !narrative.is_empty(),
                    narrative_preview: Some(format!("{preview}...")),
                    form: Some(form),
                    status: PhaseStatus::Success,
                    error: None,
                }
            }
            Err(err) => {
                error!(error = %err, "Form generation phase failed");
                FormPhase {
                    form_id: None,
                    has_clinical_narrative: false,
                    narrative_preview: None,
                    form: None,
                    status: PhaseStatus::Error,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Record a state transition and return the new state.
fn transition(workflow_id: &str, from: WorkflowState, to: WorkflowState) -> WorkflowState {
    tracing::debug!(workflow_id = workflow_id, from = ?from, to = ?to, "State transition");
    to
}

/// Concatenate up to 3 retrieved chunks' criteria metadata with "; ",
/// falling back to the standard criteria line when nothing is usable.
fn extract_policy_criteria(phase: &PolicySearchPhase) -> String {
    if phase.status != PhaseStatus::Success {
        return DEFAULT_CRITERIA.to_string();
    }
    let criteria: Vec<&str> = phase
        .results
        .iter()
        .take(POLICY_TOP_K)
        .filter_map(|chunk| chunk.metadata.criteria.as_deref())
        .collect();
    if criteria.is_empty() {
        DEFAULT_CRITERIA.to_string()
    } else {
        criteria.join("; ")
    }
}

/// The single place business policy is encoded. Order matters:
/// coverage failure denies; an eligibility-phase *error* is conservative
/// (REVIEW), while an eligibility *success with criteria unmet* denies.
fn final_recommendation(coverage: &CoveragePhase, eligibility: &EligibilityPhase) -> Recommendation {
    if coverage.status != PhaseStatus::Success || !coverage.outcome.covered {
        return Recommendation::Deny;
    }
    if eligibility.status != PhaseStatus::Success {
        return Recommendation::Review;
    }
    if eligibility.verdict.meets_criteria {
        Recommendation::Approve
    } else {
        Recommendation::Deny
    }
}

/// Human-readable summary derived purely from phase outputs.
fn build_summary(
    coverage: &CoveragePhase,
    eligibility: Option<&EligibilityPhase>,
    recommendation: Recommendation,
) -> String {
    let mut lines = vec![format!("Recommendation: {recommendation}")];

    if coverage.status == PhaseStatus::Success {
        let coverage_status = if coverage.outcome.covered {
            "Covered"
        } else {
            "Not Covered"
        };
        let pa_req = if coverage.outcome.pa_required {
            "PA Required"
        } else {
            "No PA Required"
        };
        lines.push(format!("Coverage: {coverage_status} ({pa_req})"));
    }

    if let Some(eligibility) = eligibility {
        if eligibility.status == PhaseStatus::Success {
            let criteria_status = if eligibility.verdict.meets_criteria {
                "Meets"
            } else {
                "Does Not Meet"
            };
            lines.push(format!(
                "Eligibility: {criteria_status} criteria (Confidence: {:.0}%)",
                eligibility.verdict.confidence_score * 100.0
            ));
            let justification: String = eligibility
                .verdict
                .clinical_justification
                .chars()
                .take(150)
                .collect();
            lines.push(format!("Clinical Justification: {justification}..."));
        }
    }

    lines.join("\n")
}

fn error_result(workflow_id: &str, message: String) -> WorkflowResult {
    WorkflowResult {
        workflow_id: workflow_id.to_string(),
        status: WorkflowStatus::Error,
        state: WorkflowState::Errored,
        timestamp: Utc::now(),
        patient: None,
        phases: WorkflowPhases::default(),
        recommendation: None,
        summary: None,
        error: Some(message),
    }
}
