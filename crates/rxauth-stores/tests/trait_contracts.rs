//! Trait contract tests for PatientStore, CoverageStore, and PolicyIndex.
//!
//! These tests verify the behavioral contracts of the store traits using
//! the in-memory fakes. Any conforming backend must pass these.

use rxauth_stores::fakes::{MemoryCoverageStore, MemoryPatientStore, MemoryPolicyIndex};
use rxauth_stores::model::{
    CoverageRecord, Diagnosis, LabResults, Patient, PolicyDocument, PolicyMetadata,
};
use rxauth_stores::traits::*;
use rxauth_stores::StoreError;

fn patient(id: &str, plan: &str) -> Patient {
    Patient {
        patient_id: id.to_string(),
        name: "Test Patient".to_string(),
        date_of_birth: "1980-01-01".to_string(),
        age: 45,
        gender: "Female".to_string(),
        insurance_plan: plan.to_string(),
        member_id: format!("M-{id}"),
        diagnoses: vec![Diagnosis::new("Type 2 Diabetes", "E11.9")],
        labs: LabResults::default(),
        treatment_history: vec![],
        allergies: vec![],
    }
}

fn record(plan: &str, drug: &str, covered: bool) -> CoverageRecord {
    CoverageRecord {
        plan: plan.to_string(),
        drug: drug.to_string(),
        covered,
        pa_required: covered,
        criteria: covered.then(|| "BMI > 30".to_string()),
        tier: covered.then_some(3),
        estimated_copay: covered.then_some(25.0),
        step_therapy_required: false,
        quantity_limit: None,
    }
}

fn doc(id: &str, text: &str, plan: &str) -> PolicyDocument {
    PolicyDocument {
        id: id.to_string(),
        text: text.to_string(),
        metadata: PolicyMetadata {
            plan: Some(plan.to_string()),
            drug: None,
            source: Some("formulary.pdf".to_string()),
            criteria: None,
        },
    }
}

// ===========================================================================
// PatientStore contract tests
// ===========================================================================

#[tokio::test]
async fn patient_get_round_trip() {
    let store = MemoryPatientStore::new();
    store.insert(patient("P001", "Aetna Gold"));

    let found = store.get_patient("P001").await.unwrap();
    assert_eq!(found.unwrap().insurance_plan, "Aetna Gold");
}

#[tokio::test]
async fn patient_missing_is_none_not_error() {
    let store = MemoryPatientStore::new();
    let found = store.get_patient("P999").await.unwrap();
    assert!(found.is_none());
}

// ===========================================================================
// CoverageStore contract tests
// ===========================================================================

#[tokio::test]
async fn coverage_get_round_trip() {
    let store = MemoryCoverageStore::new();
    store.insert(record("Aetna Gold", "Ozempic", true)).unwrap();

    let found = store.get_coverage("Aetna Gold", "Ozempic").await.unwrap().unwrap();
    assert!(found.covered);
    assert_eq!(found.tier, Some(3));
    assert_eq!(found.estimated_copay, Some(25.0));
}

#[tokio::test]
async fn coverage_missing_pair_is_none() {
    let store = MemoryCoverageStore::new();
    store.insert(record("Aetna Gold", "Ozempic", true)).unwrap();

    assert!(store.get_coverage("Aetna Gold", "Trulicity").await.unwrap().is_none());
    assert!(store.get_coverage("BlueCross Silver", "Ozempic").await.unwrap().is_none());
}

#[tokio::test]
async fn coverage_drug_match_is_case_sensitive() {
    let store = MemoryCoverageStore::new();
    store.insert(record("Aetna Gold", "Ozempic", true)).unwrap();

    assert!(store.get_coverage("Aetna Gold", "ozempic").await.unwrap().is_none());
}

#[tokio::test]
async fn coverage_duplicate_pair_rejected() {
    let store = MemoryCoverageStore::new();
    store.insert(record("Aetna Gold", "Ozempic", true)).unwrap();
    let err = store.insert(record("Aetna Gold", "Ozempic", false)).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[tokio::test]
async fn coverage_list_plans_and_drugs_deduplicated() {
    let store = MemoryCoverageStore::new();
    store.insert(record("Aetna Gold", "Ozempic", true)).unwrap();
    store.insert(record("Aetna Gold", "Metformin", true)).unwrap();
    store.insert(record("BlueCross Silver", "Ozempic", false)).unwrap();

    assert_eq!(store.list_plans().await.unwrap(), vec!["Aetna Gold", "BlueCross Silver"]);
    assert_eq!(store.list_drugs().await.unwrap(), vec!["Metformin", "Ozempic"]);
}

#[tokio::test]
async fn coverage_covered_drugs_filters_and_caps() {
    let store = MemoryCoverageStore::new();
    store.insert(record("Aetna Gold", "Ozempic", true)).unwrap();
    store.insert(record("Aetna Gold", "Metformin", true)).unwrap();
    store.insert(record("Aetna Gold", "Trulicity", false)).unwrap();

    let covered = store.covered_drugs("Aetna Gold", 10).await.unwrap();
    assert_eq!(covered.len(), 2);
    assert!(covered.iter().all(|r| r.covered));

    let capped = store.covered_drugs("Aetna Gold", 1).await.unwrap();
    assert_eq!(capped.len(), 1);
}

// ===========================================================================
// PolicyIndex contract tests
// ===========================================================================

#[tokio::test]
async fn index_threshold_one_on_non_identical_corpus_is_empty() {
    let index = MemoryPolicyIndex::new();
    index
        .add_documents(vec![
            doc("d1", "Ozempic coverage requires BMI over 30 and HbA1c over 7.5", "Aetna Gold"),
            doc("d2", "Metformin is first line therapy for type 2 diabetes", "Aetna Gold"),
        ])
        .await
        .unwrap();

    let hits = index.search("Ozempic eligibility rules", 5, 1.0).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn index_threshold_zero_returns_up_to_top_k_descending() {
    let index = MemoryPolicyIndex::new();
    index
        .add_documents(vec![
            doc("d1", "Ozempic coverage requires BMI over 30", "Aetna Gold"),
            doc("d2", "Ozempic step therapy with metformin", "Aetna Gold"),
            doc("d3", "Trulicity not covered", "BlueCross Silver"),
        ])
        .await
        .unwrap();

    let hits = index.search("Ozempic coverage", 2, 0.0).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].similarity >= hits[1].similarity);
}

#[tokio::test]
async fn index_filter_is_post_hoc_over_top_k() {
    let index = MemoryPolicyIndex::new();
    index
        .add_documents(vec![
            doc("d1", "dental cleaning policy", "Aetna Gold"),
            doc("d2", "vision exam policy", "Aetna Gold"),
            doc("d3", "Ozempic coverage criteria text", "Aetna Gold"),
        ])
        .await
        .unwrap();

    // top_k=1 keeps only the single best candidate; the threshold cannot
    // reach past it even though d3 would qualify at top_k=3.
    let wide = index.search("Ozempic coverage criteria", 3, 0.5).await.unwrap();
    assert!(!wide.is_empty());

    let narrow = index.search("dental vision", 1, 0.99).await.unwrap();
    assert!(narrow.len() <= 1);
}

#[tokio::test]
async fn index_stats_counts_documents() {
    let index = MemoryPolicyIndex::new();
    assert_eq!(index.stats().await.unwrap().document_count, 0);

    index.add_documents(vec![doc("d1", "text", "Aetna Gold")]).await.unwrap();
    let stats = index.stats().await.unwrap();
    assert_eq!(stats.document_count, 1);
    assert_eq!(stats.collection_name, "pa_policies");
}

#[tokio::test]
async fn index_similarity_rounded_to_four_decimals() {
    let index = MemoryPolicyIndex::new();
    index
        .add_documents(vec![doc("d1", "ozempic diabetes treatment criteria", "Aetna Gold")])
        .await
        .unwrap();

    let hits = index.search("ozempic criteria", 1, 0.0).await.unwrap();
    let similarity = hits[0].similarity;
    assert_eq!((similarity * 10_000.0).round() / 10_000.0, similarity);
}
