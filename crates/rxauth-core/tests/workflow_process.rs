//! End-to-end workflow tests over the in-memory fakes.
//!
//! Exercises the full `process_prescription` pipeline: short-circuits,
//! phase-local degradation, the recommendation rule, and form generation.

use std::sync::Arc;

use async_trait::async_trait;

use rxauth_core::{
    PhaseStatus, Recommendation, WorkflowOrchestrator, WorkflowState, WorkflowStatus,
};
use rxauth_llm::fakes::{FailingModel, ScriptedModel};
use rxauth_llm::LanguageModel;
use rxauth_stores::fakes::{MemoryCoverageStore, MemoryPatientStore, MemoryPolicyIndex};
use rxauth_stores::{
    CoverageRecord, CoverageStore, Diagnosis, IndexStats, LabResults, Patient, PolicyChunk,
    PolicyDocument, PolicyIndex, PolicyMetadata, StoreError, StoreResult, TreatmentHistory,
};

const ELIGIBLE_REPLY: &str = r#"{
    "meets_criteria": true,
    "confidence_score": 0.88,
    "clinical_justification": "HbA1c 8.2% and BMI 33.1 with documented metformin failure satisfy the policy thresholds.",
    "recommendation": "APPROVE"
}"#;

const INELIGIBLE_REPLY: &str = r#"{
    "meets_criteria": false,
    "confidence_score": 0.75,
    "clinical_justification": "BMI below the policy threshold.",
    "recommendation": "DENY"
}"#;

const NARRATIVE_REPLY: &str =
    "This patient requires escalation to GLP-1 therapy after failing first-line treatment.";

fn maria() -> Patient {
    Patient {
        patient_id: "P001".to_string(),
        name: "Maria Lopez".to_string(),
        date_of_birth: "1971-04-12".to_string(),
        age: 54,
        gender: "Female".to_string(),
        insurance_plan: "Aetna Gold".to_string(),
        member_id: "AET-100-221".to_string(),
        diagnoses: vec![Diagnosis::new("Type 2 Diabetes", "E11.9")],
        labs: LabResults {
            hba1c: Some(8.2),
            bmi: Some(33.1),
            weight_lbs: Some(205.0),
            ..Default::default()
        },
        treatment_history: vec![TreatmentHistory {
            drug: "Metformin".to_string(),
            duration_months: 6,
            dosage: Some("500mg BID".to_string()),
            outcome: "Inadequate control".to_string(),
        }],
        allergies: vec![],
    }
}

fn james() -> Patient {
    Patient {
        patient_id: "P002".to_string(),
        name: "James Okafor".to_string(),
        date_of_birth: "1964-09-30".to_string(),
        age: 61,
        gender: "Male".to_string(),
        insurance_plan: "BlueCross Silver".to_string(),
        member_id: "BCS-440-017".to_string(),
        diagnoses: vec![Diagnosis::new("Type 2 Diabetes", "E11.9")],
        labs: LabResults::default(),
        treatment_history: vec![],
        allergies: vec![],
    }
}

fn seeded_stores() -> (Arc<MemoryPatientStore>, Arc<MemoryCoverageStore>, Arc<MemoryPolicyIndex>) {
    let patients = MemoryPatientStore::new();
    patients.insert(maria());
    patients.insert(james());

    let coverage = MemoryCoverageStore::new();
    coverage
        .insert(CoverageRecord {
            plan: "Aetna Gold".to_string(),
            drug: "Ozempic".to_string(),
            covered: true,
            pa_required: true,
            criteria: Some("BMI > 30 AND HbA1c > 7.5".to_string()),
            tier: Some(3),
            estimated_copay: Some(25.0),
            step_therapy_required: false,
            quantity_limit: Some("30 day supply".to_string()),
        })
        .unwrap();
    coverage
        .insert(CoverageRecord {
            plan: "BlueCross Silver".to_string(),
            drug: "Trulicity".to_string(),
            covered: false,
            pa_required: false,
            criteria: None,
            tier: None,
            estimated_copay: None,
            step_therapy_required: false,
            quantity_limit: None,
        })
        .unwrap();

    (Arc::new(patients), Arc::new(coverage), Arc::new(MemoryPolicyIndex::new()))
}

async fn seed_policies(index: &MemoryPolicyIndex) {
    index
        .add_documents(vec![PolicyDocument {
            id: "aetna-ozempic-01".to_string(),
            text: "Ozempic authorization under Aetna Gold requires BMI over 30, HbA1c over 7.5, \
                   and a documented trial of metformin."
                .to_string(),
            metadata: PolicyMetadata {
                plan: Some("Aetna Gold".to_string()),
                drug: Some("Ozempic".to_string()),
                source: Some("aetna_formulary.pdf".to_string()),
                criteria: Some("BMI > 30 AND HbA1c > 7.5".to_string()),
            },
        }])
        .await
        .unwrap();
}

fn orchestrator(model: Arc<dyn LanguageModel>) -> WorkflowOrchestrator {
    let (patients, coverage, index) = seeded_stores();
    WorkflowOrchestrator::new(patients, coverage, index, model)
}

#[tokio::test]
async fn approved_workflow_runs_all_phases() {
    let (patients, coverage, index) = seeded_stores();
    seed_policies(&index).await;
    let model = Arc::new(ScriptedModel::new(vec![ELIGIBLE_REPLY, NARRATIVE_REPLY]));
    let orchestrator = WorkflowOrchestrator::new(patients, coverage, index, model);

    let result = orchestrator
        .process_prescription("P001", "Ozempic", "Dr. Chen", "1234567890")
        .await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.state, WorkflowState::Completed);
    assert_eq!(result.recommendation, Some(Recommendation::Approve));
    assert!(result.workflow_id.starts_with("WF_"));
    assert!(result.workflow_id.ends_with("_P001_OZEMPIC"));

    let phases = &result.phases;
    let coverage_phase = phases.coverage.as_ref().unwrap();
    assert!(coverage_phase.outcome.covered);
    assert_eq!(coverage_phase.outcome.tier, Some(3));

    let policy_phase = phases.policy_search.as_ref().unwrap();
    assert_eq!(policy_phase.policies_found, 1);

    let eligibility_phase = phases.eligibility.as_ref().unwrap();
    assert!(eligibility_phase.verdict.meets_criteria);
    assert_eq!(eligibility_phase.verdict.confidence_score, 0.88);

    let form_phase = phases.pa_form.as_ref().unwrap();
    assert!(form_phase.has_clinical_narrative);
    let form = form_phase.form.as_ref().unwrap();
    assert_eq!(form.justification.clinical_narrative, NARRATIVE_REPLY);
    assert_eq!(form.patient.insurance_plan, "Aetna Gold");

    let summary = result.summary.unwrap();
    assert!(summary.contains("Recommendation: APPROVE"));
    assert!(summary.contains("Coverage: Covered (PA Required)"));
}

#[tokio::test]
async fn not_covered_short_circuits_with_null_phases() {
    let model = Arc::new(ScriptedModel::new(vec![ELIGIBLE_REPLY, NARRATIVE_REPLY]));
    let orchestrator = orchestrator(model);

    let result = orchestrator
        .process_prescription("P002", "Trulicity", "Dr. Chen", "1234567890")
        .await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.state, WorkflowState::NotCovered);
    assert_eq!(result.recommendation, Some(Recommendation::Deny));

    let coverage_phase = result.phases.coverage.as_ref().unwrap();
    assert!(!coverage_phase.outcome.covered);
    assert!(coverage_phase
        .outcome
        .reason
        .as_ref()
        .unwrap()
        .contains("not covered"));

    // Skipped phases are explicitly absent, and stay absent through
    // serialization.
    assert!(result.phases.policy_search.is_none());
    assert!(result.phases.eligibility.is_none());
    assert!(result.phases.pa_form.is_none());

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["phases"]["eligibility"].is_null());
    assert!(json["phases"]["pa_form"].is_null());
}

#[tokio::test]
async fn eligibility_failure_degrades_to_review() {
    let orchestrator = orchestrator(Arc::new(FailingModel::default()));

    let result = orchestrator
        .process_prescription("P001", "Ozempic", "Dr. Chen", "1234567890")
        .await;

    // Model failure never aborts the workflow and never approves.
    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.recommendation, Some(Recommendation::Review));

    let eligibility_phase = result.phases.eligibility.as_ref().unwrap();
    assert_eq!(eligibility_phase.status, PhaseStatus::Error);
    assert!(!eligibility_phase.verdict.meets_criteria);
}

#[tokio::test]
async fn criteria_unmet_denies() {
    let model = Arc::new(ScriptedModel::new(vec![INELIGIBLE_REPLY, NARRATIVE_REPLY]));
    let orchestrator = orchestrator(model);

    let result = orchestrator
        .process_prescription("P001", "Ozempic", "Dr. Chen", "1234567890")
        .await;

    assert_eq!(result.recommendation, Some(Recommendation::Deny));
    let eligibility_phase = result.phases.eligibility.as_ref().unwrap();
    assert_eq!(eligibility_phase.status, PhaseStatus::Success);
    assert!(!eligibility_phase.verdict.meets_criteria);
}

#[tokio::test]
async fn form_still_generated_after_eligibility_failure() {
    // Eligibility JSON is garbage (parse error), narrative call succeeds:
    // the form is built around the default verdict.
    let model = Arc::new(ScriptedModel::new(vec!["no json here", NARRATIVE_REPLY]));
    let orchestrator = orchestrator(model);

    let result = orchestrator
        .process_prescription("P001", "Ozempic", "Dr. Chen", "1234567890")
        .await;

    assert_eq!(result.recommendation, Some(Recommendation::Review));

    let form_phase = result.phases.pa_form.as_ref().unwrap();
    assert_eq!(form_phase.status, PhaseStatus::Success);
    let form = form_phase.form.as_ref().unwrap();
    assert!(!form.eligibility.meets_criteria);
    assert_eq!(form.justification.clinical_narrative, NARRATIVE_REPLY);
}

#[tokio::test]
async fn missing_patient_aborts_with_traceable_id() {
    let model = Arc::new(ScriptedModel::new(vec![ELIGIBLE_REPLY, NARRATIVE_REPLY]));
    let orchestrator = orchestrator(model);

    let result = orchestrator
        .process_prescription("P404", "Ozempic", "Dr. Chen", "1234567890")
        .await;

    assert_eq!(result.status, WorkflowStatus::Error);
    assert_eq!(result.state, WorkflowState::Errored);
    assert!(result.workflow_id.contains("P404"));
    assert!(result.error.unwrap().contains("not found"));
    assert!(result.recommendation.is_none());
    assert!(result.phases.coverage.is_none());
    assert!(result.phases.pa_form.is_none());
}

// ---------------------------------------------------------------------------
// Degraded-infrastructure doubles
// ---------------------------------------------------------------------------

struct OfflineIndex;

#[async_trait]
impl PolicyIndex for OfflineIndex {
    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _min_similarity: f64,
    ) -> StoreResult<Vec<PolicyChunk>> {
        Err(StoreError::Unavailable("vector index offline".to_string()))
    }

    async fn add_documents(&self, _documents: Vec<PolicyDocument>) -> StoreResult<()> {
        Err(StoreError::Unavailable("vector index offline".to_string()))
    }

    async fn stats(&self) -> StoreResult<IndexStats> {
        Err(StoreError::Unavailable("vector index offline".to_string()))
    }
}

struct OfflineCoverage;

#[async_trait]
impl CoverageStore for OfflineCoverage {
    async fn get_coverage(&self, _plan: &str, _drug: &str) -> StoreResult<Option<CoverageRecord>> {
        Err(StoreError::Unavailable("coverage store offline".to_string()))
    }

    async fn list_plans(&self) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("coverage store offline".to_string()))
    }

    async fn list_drugs(&self) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("coverage store offline".to_string()))
    }

    async fn covered_drugs(&self, _plan: &str, _limit: usize) -> StoreResult<Vec<CoverageRecord>> {
        Err(StoreError::Unavailable("coverage store offline".to_string()))
    }
}

#[tokio::test]
async fn policy_index_failure_degrades_phase_not_workflow() {
    let (patients, coverage, _) = seeded_stores();
    let model = Arc::new(ScriptedModel::new(vec![ELIGIBLE_REPLY, NARRATIVE_REPLY]));
    let orchestrator =
        WorkflowOrchestrator::new(patients, coverage, Arc::new(OfflineIndex), model);

    let result = orchestrator
        .process_prescription("P001", "Ozempic", "Dr. Chen", "1234567890")
        .await;

    // The workflow still completes with a recommendation.
    assert_eq!(result.status, WorkflowStatus::Completed);
    assert!(result.recommendation.is_some());

    let policy_phase = result.phases.policy_search.as_ref().unwrap();
    assert_eq!(policy_phase.status, PhaseStatus::Error);
    assert_eq!(policy_phase.policies_found, 0);

    // The reasoner's own retrieval hits the same offline index, so the
    // eligibility phase degrades too — and degradation means REVIEW.
    assert_eq!(result.recommendation, Some(Recommendation::Review));
}

#[tokio::test]
async fn coverage_store_failure_short_circuits_to_deny() {
    let (patients, _, index) = seeded_stores();
    let model = Arc::new(ScriptedModel::new(vec![ELIGIBLE_REPLY, NARRATIVE_REPLY]));
    let orchestrator =
        WorkflowOrchestrator::new(patients, Arc::new(OfflineCoverage), index, model);

    let result = orchestrator
        .process_prescription("P001", "Ozempic", "Dr. Chen", "1234567890")
        .await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.state, WorkflowState::NotCovered);
    assert_eq!(result.recommendation, Some(Recommendation::Deny));

    let coverage_phase = result.phases.coverage.as_ref().unwrap();
    assert_eq!(coverage_phase.status, PhaseStatus::Error);
    assert!(coverage_phase.error.as_ref().unwrap().contains("offline"));
}

#[tokio::test]
async fn workflow_reads_do_not_mutate_stores() {
    let (patients, coverage, index) = seeded_stores();
    seed_policies(&index).await;
    let model = Arc::new(ScriptedModel::new(vec![
        ELIGIBLE_REPLY,
        NARRATIVE_REPLY,
        ELIGIBLE_REPLY,
        NARRATIVE_REPLY,
    ]));
    let orchestrator = WorkflowOrchestrator::new(patients, coverage, index, model);

    let first = orchestrator
        .process_prescription("P001", "Ozempic", "Dr. Chen", "1234567890")
        .await;
    let second = orchestrator
        .process_prescription("P001", "Ozempic", "Dr. Chen", "1234567890")
        .await;

    // Identical inputs, identical phase outputs (ids/timestamps aside).
    assert_eq!(first.recommendation, second.recommendation);
    assert_eq!(
        first.phases.coverage.as_ref().unwrap().outcome,
        second.phases.coverage.as_ref().unwrap().outcome
    );
    assert_eq!(
        first.phases.policy_search.as_ref().unwrap().policies_found,
        second.phases.policy_search.as_ref().unwrap().policies_found
    );
}
