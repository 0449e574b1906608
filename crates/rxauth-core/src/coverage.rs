//! Coverage resolution: is a drug covered, and is PA required?
//!
//! A pure lookup translated into a typed result. Every negative outcome
//! carries an explanatory reason; positive outcomes carry the full stored
//! record fields unchanged. The resolver never retries — a store failure
//! is an infrastructure error and propagates to the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use rxauth_stores::{CoverageRecord, CoverageStore, PatientStore};

use crate::error::Result;

/// Outcome of a coverage check.
///
/// For covered drugs, `criteria`/`tier`/`estimated_copay`/`quantity_limit`
/// round-trip the stored record exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageOutcome {
    pub covered: bool,
    pub pa_required: bool,
    pub criteria: Option<String>,
    pub tier: Option<u8>,
    pub estimated_copay: Option<f64>,
    pub step_therapy_required: bool,
    pub quantity_limit: Option<String>,
    /// Mandatory for every negative outcome, informative for positive ones.
    pub reason: Option<String>,
}

impl CoverageOutcome {
    /// Negative outcome with its mandatory reason.
    pub fn not_covered(reason: impl Into<String>) -> Self {
        CoverageOutcome {
            covered: false,
            pa_required: false,
            criteria: None,
            tier: None,
            estimated_copay: None,
            step_therapy_required: false,
            quantity_limit: None,
            reason: Some(reason.into()),
        }
    }

    /// Positive outcome carrying the stored record's fields.
    fn from_record(record: CoverageRecord) -> Self {
        let reason = if record.pa_required {
            "Coverage found, prior authorization required"
        } else {
            "Covered, no PA required"
        };
        CoverageOutcome {
            covered: true,
            pa_required: record.pa_required,
            criteria: record.criteria,
            tier: record.tier,
            estimated_copay: record.estimated_copay,
            step_therapy_required: record.step_therapy_required,
            quantity_limit: record.quantity_limit,
            reason: Some(reason.to_string()),
        }
    }
}

/// A patient's insurance identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceInfo {
    pub patient_id: String,
    pub name: String,
    pub insurance_plan: String,
    pub member_id: String,
}

/// Resolves coverage questions against the patient and coverage stores.
pub struct CoverageResolver {
    patients: Arc<dyn PatientStore>,
    coverage: Arc<dyn CoverageStore>,
}

impl CoverageResolver {
    pub fn new(patients: Arc<dyn PatientStore>, coverage: Arc<dyn CoverageStore>) -> Self {
        Self { patients, coverage }
    }

    /// Check coverage for a patient's plan. A missing patient is a negative
    /// outcome here, not an error — callers that need the patient record
    /// itself (form generation) treat absence as fatal instead.
    pub async fn resolve(&self, patient_id: &str, drug: &str) -> Result<CoverageOutcome> {
        info!(patient_id = patient_id, drug = drug, "Checking coverage");

        let patient = match self.patients.get_patient(patient_id).await? {
            Some(patient) => patient,
            None => {
                warn!(patient_id = patient_id, "Patient not found");
                return Ok(CoverageOutcome::not_covered(format!(
                    "Patient not found: {patient_id}"
                )));
            }
        };

        self.resolve_plan(&patient.insurance_plan, drug).await
    }

    /// Check coverage for a specific plan and drug, without a patient.
    /// Drug names match case-sensitively against the formulary.
    pub async fn resolve_plan(&self, plan: &str, drug: &str) -> Result<CoverageOutcome> {
        let record = match self.coverage.get_coverage(plan, drug).await? {
            Some(record) => record,
            None => {
                warn!(plan = plan, drug = drug, "Drug not in formulary");
                return Ok(CoverageOutcome::not_covered(format!(
                    "Drug not in formulary for {plan}"
                )));
            }
        };

        if !record.covered {
            return Ok(CoverageOutcome::not_covered(format!(
                "Drug not covered under {plan}"
            )));
        }

        info!(drug = drug, pa_required = record.pa_required, "Drug covered");
        Ok(CoverageOutcome::from_record(record))
    }

    /// Covered alternatives under a plan, capped at 10 entries.
    pub async fn covered_alternatives(&self, plan: &str) -> Result<Vec<CoverageRecord>> {
        Ok(self.coverage.covered_drugs(plan, 10).await?)
    }

    /// Insurance identifiers for a patient, if the patient exists.
    pub async fn patient_insurance_info(&self, patient_id: &str) -> Result<Option<InsuranceInfo>> {
        let patient = self.patients.get_patient(patient_id).await?;
        Ok(patient.map(|p| InsuranceInfo {
            patient_id: p.patient_id,
            name: p.name,
            insurance_plan: p.insurance_plan,
            member_id: p.member_id,
        }))
    }
}
