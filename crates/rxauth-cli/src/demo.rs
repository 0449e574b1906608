//! Built-in demo dataset: patients, formulary entries, and policy
//! documents loaded into the in-memory stores at startup.

use rxauth_stores::fakes::{MemoryCoverageStore, MemoryPatientStore, MemoryPolicyIndex};
use rxauth_stores::{
    CoverageRecord, Diagnosis, LabResults, Patient, PolicyDocument, PolicyIndex, PolicyMetadata,
    TreatmentHistory,
};

pub fn demo_patients() -> Vec<Patient> {
    vec![
        Patient {
            patient_id: "P001".to_string(),
            name: "Maria Lopez".to_string(),
            date_of_birth: "1971-04-12".to_string(),
            age: 54,
            gender: "Female".to_string(),
            insurance_plan: "Aetna Gold".to_string(),
            member_id: "AET-100-221".to_string(),
            diagnoses: vec![
                Diagnosis::new("Type 2 Diabetes", "E11.9"),
                Diagnosis::new("Obesity", "E66.9"),
            ],
            labs: LabResults {
                hba1c: Some(8.2),
                fasting_glucose: Some(162),
                bmi: Some(33.1),
                weight_lbs: Some(205.0),
                creatinine: Some(0.9),
                egfr: Some(92),
                ..Default::default()
            },
            treatment_history: vec![
                TreatmentHistory {
                    drug: "Metformin".to_string(),
                    duration_months: 6,
                    dosage: Some("500mg BID".to_string()),
                    outcome: "Inadequate control".to_string(),
                },
                TreatmentHistory {
                    drug: "Glipizide".to_string(),
                    duration_months: 4,
                    dosage: Some("5mg QD".to_string()),
                    outcome: "Hypoglycemia episodes".to_string(),
                },
            ],
            allergies: vec!["Penicillin".to_string()],
        },
        Patient {
            patient_id: "P002".to_string(),
            name: "James Okafor".to_string(),
            date_of_birth: "1964-09-30".to_string(),
            age: 61,
            gender: "Male".to_string(),
            insurance_plan: "BlueCross Silver".to_string(),
            member_id: "BCS-440-017".to_string(),
            diagnoses: vec![Diagnosis::new("Type 2 Diabetes", "E11.9")],
            labs: LabResults {
                hba1c: Some(7.1),
                bmi: Some(27.4),
                ..Default::default()
            },
            treatment_history: vec![TreatmentHistory {
                drug: "Metformin".to_string(),
                duration_months: 12,
                dosage: Some("1000mg BID".to_string()),
                outcome: "Partial response".to_string(),
            }],
            allergies: vec![],
        },
        Patient {
            patient_id: "P003".to_string(),
            name: "Anh Tran".to_string(),
            date_of_birth: "1988-02-03".to_string(),
            age: 38,
            gender: "Female".to_string(),
            insurance_plan: "Aetna Gold".to_string(),
            member_id: "AET-100-587".to_string(),
            diagnoses: vec![Diagnosis::new("Type 2 Diabetes", "E11.9")],
            labs: LabResults {
                hba1c: Some(6.8),
                bmi: Some(24.9),
                ..Default::default()
            },
            treatment_history: vec![],
            allergies: vec![],
        },
    ]
}

pub fn demo_formulary() -> Vec<CoverageRecord> {
    vec![
        CoverageRecord {
            plan: "Aetna Gold".to_string(),
            drug: "Ozempic".to_string(),
            covered: true,
            pa_required: true,
            criteria: Some("BMI > 30 AND HbA1c > 7.5".to_string()),
            tier: Some(3),
            estimated_copay: Some(25.0),
            step_therapy_required: false,
            quantity_limit: Some("30 day supply".to_string()),
        },
        CoverageRecord {
            plan: "Aetna Gold".to_string(),
            drug: "Metformin".to_string(),
            covered: true,
            pa_required: false,
            criteria: None,
            tier: Some(1),
            estimated_copay: Some(10.0),
            step_therapy_required: false,
            quantity_limit: None,
        },
        CoverageRecord {
            plan: "Aetna Gold".to_string(),
            drug: "Mounjaro".to_string(),
            covered: true,
            pa_required: true,
            criteria: Some("HbA1c > 8.0 AND documented metformin failure".to_string()),
            tier: Some(3),
            estimated_copay: Some(40.0),
            step_therapy_required: true,
            quantity_limit: Some("30 day supply".to_string()),
        },
        CoverageRecord {
            plan: "BlueCross Silver".to_string(),
            drug: "Trulicity".to_string(),
            covered: false,
            pa_required: false,
            criteria: None,
            tier: None,
            estimated_copay: None,
            step_therapy_required: false,
            quantity_limit: None,
        },
        CoverageRecord {
            plan: "BlueCross Silver".to_string(),
            drug: "Metformin".to_string(),
            covered: true,
            pa_required: false,
            criteria: None,
            tier: Some(1),
            estimated_copay: Some(8.0),
            step_therapy_required: false,
            quantity_limit: None,
        },
    ]
}

pub fn demo_policies() -> Vec<PolicyDocument> {
    vec![
        PolicyDocument {
            id: "aetna-ozempic-01".to_string(),
            text: "Ozempic (semaglutide) is approved under Aetna Gold for members with type 2 \
                   diabetes when BMI exceeds 30 kg/m2, HbA1c exceeds 7.5%, and the member has \
                   completed at least a 3 month trial of metformin with inadequate glycemic \
                   control or documented intolerance."
                .to_string(),
            metadata: PolicyMetadata {
                plan: Some("Aetna Gold".to_string()),
                drug: Some("Ozempic".to_string()),
                source: Some("aetna_gold_formulary_2026.pdf".to_string()),
                criteria: Some("BMI > 30 AND HbA1c > 7.5".to_string()),
            },
        },
        PolicyDocument {
            id: "aetna-mounjaro-01".to_string(),
            text: "Mounjaro (tirzepatide) requires prior authorization under Aetna Gold. \
                   Approval criteria: HbA1c above 8.0% despite maximally tolerated metformin, \
                   and step therapy through at least one additional oral agent."
                .to_string(),
            metadata: PolicyMetadata {
                plan: Some("Aetna Gold".to_string()),
                drug: Some("Mounjaro".to_string()),
                source: Some("aetna_gold_formulary_2026.pdf".to_string()),
                criteria: Some("HbA1c > 8.0 AND documented metformin failure".to_string()),
            },
        },
        PolicyDocument {
            id: "bcs-glp1-01".to_string(),
            text: "BlueCross Silver excludes GLP-1 receptor agonists including Trulicity from \
                   the standard formulary. Members may appeal with documentation of medical \
                   necessity and contraindication to all covered alternatives."
                .to_string(),
            metadata: PolicyMetadata {
                plan: Some("BlueCross Silver".to_string()),
                drug: Some("Trulicity".to_string()),
                source: Some("bcs_silver_exclusions_2026.pdf".to_string()),
                criteria: None,
            },
        },
    ]
}

/// Load the demo dataset into fresh in-memory stores.
pub async fn seeded_stores() -> anyhow::Result<(
    MemoryPatientStore,
    MemoryCoverageStore,
    MemoryPolicyIndex,
)> {
    let patients = MemoryPatientStore::new();
    for patient in demo_patients() {
        patient.validate()?;
        patients.insert(patient);
    }

    let coverage = MemoryCoverageStore::new();
    for record in demo_formulary() {
        coverage.insert(record)?;
    }

    let index = MemoryPolicyIndex::new();
    index.add_documents(demo_policies()).await?;

    Ok((patients, coverage, index))
}
