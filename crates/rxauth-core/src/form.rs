//! PA form assembly with LLM-generated clinical narratives.
//!
//! Builds the complete form record around an eligibility verdict, renders
//! it as a printable markdown document, and optionally persists it as
//! JSON + markdown artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use rxauth_llm::{ChatMessage, CompletionRequest, LanguageModel};
use rxauth_stores::{Patient, PatientStore};

use crate::eligibility::{format_diagnoses, format_treatment_history, EligibilityVerdict, LlmCallMeta, VerdictRecommendation};
use crate::error::{PaError, Result};
use crate::prompts;

/// Narrative generation runs warmer than eligibility reasoning: prose
/// variety matters, determinism does not.
const NARRATIVE_TEMPERATURE: f64 = 0.7;
const NARRATIVE_MAX_TOKENS: u32 = 500;

/// Form header metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormHeader {
    pub form_id: String,
    pub submission_date: DateTime<Utc>,
    pub requesting_provider: String,
    pub npi: String,
}

/// Patient demographic block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSection {
    pub patient_id: String,
    pub patient_name: String,
    pub date_of_birth: String,
    pub member_id: String,
    pub insurance_plan: String,
}

/// Medication block. Dosing fields are fixed placeholders — the system
/// does not infer dosing from clinical data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSection {
    pub drug_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub diagnosis_code: String,
    pub diagnosis_description: String,
}

/// Justification block: the generated narrative plus supporting fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JustificationSection {
    pub clinical_narrative: String,
    pub failed_treatments: String,
    pub clinical_findings: String,
    pub supporting_evidence: String,
    pub contraindications: String,
}

/// Snapshot of the eligibility verdict's key fields carried on the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictSnapshot {
    pub meets_criteria: bool,
    pub confidence_score: f64,
    pub recommendation: VerdictRecommendation,
}

/// A complete prior-authorization form. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaFormRecord {
    pub header: FormHeader,
    pub patient: PatientSection,
    pub medication: MedicationSection,
    pub justification: JustificationSection,
    pub eligibility: VerdictSnapshot,
    pub llm: LlmCallMeta,
}

impl PaFormRecord {
    /// Render the form as a printable markdown document.
    ///
    /// Pure transform; no side effects.
    pub fn to_markdown(&self) -> String {
        format!(
            "\
# PRIOR AUTHORIZATION REQUEST

## Form Information
- **Form ID**: {form_id}
- **Submission Date**: {submission_date}
- **Requesting Provider**: {provider}
- **NPI**: {npi}

## Patient Information
- **Name**: {patient_name}
- **Date of Birth**: {date_of_birth}
- **Member ID**: {member_id}
- **Insurance Plan**: {insurance_plan}

## Clinical Information
- **Requested Drug**: {drug_name}
- **Dosage**: {dosage}
- **Frequency**: {frequency}
- **Expected Duration**: {duration}
- **Primary Diagnosis**: {diagnosis_description} ({diagnosis_code})

## Clinical Justification

{clinical_narrative}

### Failed Prior Treatments
{failed_treatments}

### Clinical Findings
{clinical_findings}

### Supporting Evidence
{supporting_evidence}

---
**Confidential - For Insurance Use Only**
",
            form_id = self.header.form_id,
            submission_date = self.header.submission_date.to_rfc3339(),
            provider = self.header.requesting_provider,
            npi = self.header.npi,
            patient_name = self.patient.patient_name,
            date_of_birth = self.patient.date_of_birth,
            member_id = self.patient.member_id,
            insurance_plan = self.patient.insurance_plan,
            drug_name = self.medication.drug_name,
            dosage = self.medication.dosage,
            frequency = self.medication.frequency,
            duration = self.medication.duration,
            diagnosis_description = self.medication.diagnosis_description,
            diagnosis_code = self.medication.diagnosis_code,
            clinical_narrative = self.justification.clinical_narrative,
            failed_treatments = self.justification.failed_treatments,
            clinical_findings = self.justification.clinical_findings,
            supporting_evidence = self.justification.supporting_evidence,
        )
    }
}

/// Deterministic, human-traceable form id: date + patient + uppercased
/// drug. Collides only when the same patient/drug pair is processed twice
/// the same day (accepted limitation).
pub fn form_id(date: DateTime<Utc>, patient_id: &str, drug: &str) -> String {
    format!(
        "PA_{}_{}_{}",
        date.format("%Y%m%d"),
        patient_id,
        drug.to_uppercase()
    )
}

/// Assembles PA forms around eligibility verdicts.
pub struct FormAssembler {
    patients: Arc<dyn PatientStore>,
    model: Arc<dyn LanguageModel>,
}

impl FormAssembler {
    pub fn new(patients: Arc<dyn PatientStore>, model: Arc<dyn LanguageModel>) -> Self {
        Self { patients, model }
    }

    /// Generate a complete PA form with an LLM-written clinical narrative.
    ///
    /// The patient must exist: the form cannot be built without demographic
    /// and diagnosis data, so absence is a hard error here.
    pub async fn generate(
        &self,
        patient_id: &str,
        drug: &str,
        verdict: &EligibilityVerdict,
        provider_name: &str,
        npi: &str,
    ) -> Result<PaFormRecord> {
        info!(patient_id = patient_id, drug = drug, "Generating PA form");

        let patient = self
            .patients
            .get_patient(patient_id)
            .await?
            .ok_or_else(|| PaError::PatientNotFound(patient_id.to_string()))?;

        let diagnoses = format_diagnoses(&patient.diagnoses);
        let prompt = prompts::narrative_prompt(
            &patient.name,
            patient.age,
            &patient.gender,
            &diagnoses,
            drug,
            &verdict.clinical_justification,
        );

        let response = self
            .model
            .complete(CompletionRequest::new(
                vec![
                    ChatMessage::system(prompts::NARRATIVE_SYSTEM_PROMPT),
                    ChatMessage::user(prompt),
                ],
                NARRATIVE_TEMPERATURE,
                NARRATIVE_MAX_TOKENS,
            ))
            .await?;

        let now = Utc::now();
        let record = PaFormRecord {
            header: FormHeader {
                form_id: form_id(now, patient_id, drug),
                submission_date: now,
                requesting_provider: provider_name.to_string(),
                npi: npi.to_string(),
            },
            patient: patient_section(&patient),
            medication: medication_section(&patient, drug),
            justification: JustificationSection {
                clinical_narrative: response.content.clone(),
                failed_treatments: failed_treatments_summary(&patient),
                clinical_findings: diagnoses,
                supporting_evidence: "Clinical determination and policy compliance verified"
                    .to_string(),
                contraindications: "None noted".to_string(),
            },
            eligibility: VerdictSnapshot {
                meets_criteria: verdict.meets_criteria,
                confidence_score: verdict.confidence_score,
                recommendation: verdict.recommendation,
            },
            llm: LlmCallMeta {
                model: response.model,
                latency_ms: response.latency_ms,
                tokens_used: response.tokens_used,
                cost: response.cost,
            },
        };

        info!(form_id = %record.header.form_id, "PA form generated");
        Ok(record)
    }
}

fn patient_section(patient: &Patient) -> PatientSection {
    PatientSection {
        patient_id: patient.patient_id.clone(),
        patient_name: patient.name.clone(),
        date_of_birth: patient.date_of_birth.clone(),
        member_id: patient.member_id.clone(),
        insurance_plan: patient.insurance_plan.clone(),
    }
}

fn medication_section(patient: &Patient, drug: &str) -> MedicationSection {
    // Primary diagnosis is the first recorded one; validation guarantees
    // at least one exists.
    let primary = patient.diagnoses.first();
    MedicationSection {
        drug_name: drug.to_string(),
        dosage: "As prescribed".to_string(),
        frequency: "As prescribed".to_string(),
        duration: "3 months".to_string(),
        diagnosis_code: primary.map(|d| d.icd10.clone()).unwrap_or_default(),
        diagnosis_description: primary.map(|d| d.name.clone()).unwrap_or_default(),
    }
}

fn failed_treatments_summary(patient: &Patient) -> String {
    if patient.treatment_history.is_empty() {
        "See medical record".to_string()
    } else {
        format_treatment_history(&patient.treatment_history)
    }
}

/// Persist `<dir>/<form_id>.json` and `<dir>/<form_id>.md`.
pub fn write_form_artifact(record: &PaFormRecord, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let json_path = dir.join(format!("{}.json", record.header.form_id));
    let md_path = dir.join(format!("{}.md", record.header.form_id));

    std::fs::write(&json_path, serde_json::to_vec_pretty(record)?)?;
    std::fs::write(&md_path, record.to_markdown())?;

    Ok(json_path)
}
