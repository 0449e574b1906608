//! Record types shared by the store traits.
//!
//! These are the reference data and patient records the workflow core
//! consumes. Validation happens here, at the data-entry boundary — the
//! core assumes any `Patient` it receives has already passed
//! [`Patient::validate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Patient
// ---------------------------------------------------------------------------

/// A diagnosis with its ICD-10 code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub name: String,
    pub icd10: String,
}

impl Diagnosis {
    pub fn new(name: impl Into<String>, icd10: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icd10: icd10.into(),
        }
    }
}

/// One prior treatment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentHistory {
    pub drug: String,
    /// Months on the drug. Must be >= 1.
    pub duration_months: u32,
    pub dosage: Option<String>,
    pub outcome: String,
}

/// Laboratory results. All fields optional; a missing value means the lab
/// was not drawn, not that it was zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabResults {
    pub hba1c: Option<f64>,
    pub fasting_glucose: Option<u32>,
    pub bmi: Option<f64>,
    pub weight_lbs: Option<f64>,
    pub creatinine: Option<f64>,
    pub egfr: Option<u32>,
    pub alt: Option<u32>,
    pub ast: Option<u32>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Full patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub name: String,
    pub date_of_birth: String,
    pub age: u32,
    pub gender: String,
    pub insurance_plan: String,
    pub member_id: String,
    /// Ordered; must contain at least one entry.
    pub diagnoses: Vec<Diagnosis>,
    pub labs: LabResults,
    /// Ordered, oldest first.
    pub treatment_history: Vec<TreatmentHistory>,
    pub allergies: Vec<String>,
}

/// Validation failures rejected at the data-entry boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("patient {patient_id}: at least one diagnosis is required")]
    NoDiagnoses { patient_id: String },

    #[error("patient {patient_id}: age {age} outside plausible range [0, 150]")]
    AgeOutOfRange { patient_id: String, age: u32 },

    #[error("patient {patient_id}: {field} value {value} outside plausible range [{min}, {max}]")]
    LabOutOfRange {
        patient_id: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("patient {patient_id}: treatment history entry for {drug} has zero duration")]
    ZeroDurationTreatment { patient_id: String, drug: String },
}

impl Patient {
    /// Check the record against clinical plausibility bounds.
    ///
    /// Bounds: age 0–150, BMI 10–60, HbA1c 3–15%, creatinine 0.1–15 mg/dL,
    /// eGFR 0–150. Treatment durations must be at least one month.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.diagnoses.is_empty() {
            return Err(ValidationError::NoDiagnoses {
                patient_id: self.patient_id.clone(),
            });
        }
        if self.age > 150 {
            return Err(ValidationError::AgeOutOfRange {
                patient_id: self.patient_id.clone(),
                age: self.age,
            });
        }

        self.check_lab_bound("BMI", self.labs.bmi, 10.0, 60.0)?;
        self.check_lab_bound("HbA1c", self.labs.hba1c, 3.0, 15.0)?;
        self.check_lab_bound("creatinine", self.labs.creatinine, 0.1, 15.0)?;
        self.check_lab_bound("eGFR", self.labs.egfr.map(f64::from), 0.0, 150.0)?;

        for treatment in &self.treatment_history {
            if treatment.duration_months == 0 {
                return Err(ValidationError::ZeroDurationTreatment {
                    patient_id: self.patient_id.clone(),
                    drug: treatment.drug.clone(),
                });
            }
        }

        Ok(())
    }

    fn check_lab_bound(
        &self,
        field: &'static str,
        value: Option<f64>,
        min: f64,
        max: f64,
    ) -> Result<(), ValidationError> {
        if let Some(v) = value {
            if v < min || v > max {
                return Err(ValidationError::LabOutOfRange {
                    patient_id: self.patient_id.clone(),
                    field,
                    value: v,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CoverageRecord
// ---------------------------------------------------------------------------

/// Formulary entry: coverage rules for one (plan, drug) pair.
///
/// Immutable reference data; at most one record exists per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub plan: String,
    pub drug: String,
    pub covered: bool,
    pub pa_required: bool,
    pub criteria: Option<String>,
    pub tier: Option<u8>,
    pub estimated_copay: Option<f64>,
    pub step_therapy_required: bool,
    pub quantity_limit: Option<String>,
}

impl CoverageRecord {
    /// Lookup key for this record.
    pub fn key(&self) -> String {
        coverage_key(&self.plan, &self.drug)
    }
}

/// Composite (plan, drug) key. Drug names match case-sensitively.
pub fn coverage_key(plan: &str, drug: &str) -> String {
    format!("{plan}::{drug}")
}

// ---------------------------------------------------------------------------
// Policy index records
// ---------------------------------------------------------------------------

/// Metadata attached to an indexed policy fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    pub plan: Option<String>,
    pub drug: Option<String>,
    pub source: Option<String>,
    /// Extracted eligibility criteria text, when the source document
    /// carries one. Consumed by the orchestrator's criteria extraction.
    pub criteria: Option<String>,
}

/// A document submitted for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub id: String,
    pub text: String,
    pub metadata: PolicyMetadata,
}

/// A scored search hit from the policy index. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyChunk {
    pub id: String,
    pub text: String,
    pub metadata: PolicyMetadata,
    /// `1 - cosine_distance`, rounded to 4 decimal digits.
    pub similarity: f64,
}

/// Index statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub collection_name: String,
    pub document_count: usize,
}

/// Round a similarity score to the fixed 4-decimal precision used across
/// the index boundary, so results are reproducible.
pub fn round_similarity(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
