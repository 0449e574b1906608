//! In-memory fakes for store traits (testing and demo use)
//!
//! Provides `MemoryPatientStore`, `MemoryCoverageStore`, and
//! `MemoryPolicyIndex` that satisfy the trait contracts without any external
//! dependencies.
//!
//! `MemoryPolicyIndex` scores documents with real cosine similarity over
//! term-frequency vectors, so similarity semantics (`1 - cosine_distance`,
//! descending order, 4-decimal rounding) match what a vector database
//! backend would produce, deterministically.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{coverage_key, round_similarity};
use crate::model::{CoverageRecord, IndexStats, Patient, PolicyChunk, PolicyDocument};
use crate::traits::{CoverageStore, PatientStore, PolicyIndex, StoreResult};

// ---------------------------------------------------------------------------
// MemoryPatientStore
// ---------------------------------------------------------------------------

/// In-memory patient store backed by a `HashMap<patient_id, Patient>`.
#[derive(Debug, Default)]
pub struct MemoryPatientStore {
    patients: Mutex<HashMap<String, Patient>>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a patient record, replacing any existing record with the same id.
    pub fn insert(&self, patient: Patient) {
        let mut patients = self.patients.lock().unwrap();
        patients.insert(patient.patient_id.clone(), patient);
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn get_patient(&self, patient_id: &str) -> StoreResult<Option<Patient>> {
        let patients = self.patients.lock().unwrap();
        Ok(patients.get(patient_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryCoverageStore
// ---------------------------------------------------------------------------

/// In-memory formulary backed by a `HashMap<(plan::drug), CoverageRecord>`.
#[derive(Debug, Default)]
pub struct MemoryCoverageStore {
    records: Mutex<HashMap<String, CoverageRecord>>,
}

impl MemoryCoverageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a coverage record. Fails if the (plan, drug) pair is already
    /// indexed — reference data holds at most one record per pair.
    pub fn insert(&self, record: CoverageRecord) -> StoreResult<()> {
        let key = record.key();
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&key) {
            return Err(StoreError::Duplicate(key));
        }
        records.insert(key, record);
        Ok(())
    }
}

#[async_trait]
impl CoverageStore for MemoryCoverageStore {
    async fn get_coverage(&self, plan: &str, drug: &str) -> StoreResult<Option<CoverageRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(&coverage_key(plan, drug)).cloned())
    }

    async fn list_plans(&self) -> StoreResult<Vec<String>> {
        let records = self.records.lock().unwrap();
        let mut plans: Vec<String> = records.values().map(|r| r.plan.clone()).collect();
        plans.sort();
        plans.dedup();
        Ok(plans)
    }

    async fn list_drugs(&self) -> StoreResult<Vec<String>> {
        let records = self.records.lock().unwrap();
        let mut drugs: Vec<String> = records.values().map(|r| r.drug.clone()).collect();
        drugs.sort();
        drugs.dedup();
        Ok(drugs)
    }

    async fn covered_drugs(&self, plan: &str, limit: usize) -> StoreResult<Vec<CoverageRecord>> {
        let records = self.records.lock().unwrap();
        let mut covered: Vec<CoverageRecord> = records
            .values()
            .filter(|r| r.plan == plan && r.covered)
            .cloned()
            .collect();
        covered.sort_by(|a, b| a.drug.cmp(&b.drug));
        covered.truncate(limit);
        Ok(covered)
    }
}

// ---------------------------------------------------------------------------
// MemoryPolicyIndex
// ---------------------------------------------------------------------------

/// In-memory policy index with term-frequency cosine scoring.
#[derive(Debug, Default)]
pub struct MemoryPolicyIndex {
    documents: Mutex<Vec<PolicyDocument>>,
}

impl MemoryPolicyIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyIndex for MemoryPolicyIndex {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> StoreResult<Vec<PolicyChunk>> {
        let documents = self.documents.lock().unwrap();
        let query_tf = term_frequencies(query);

        let mut scored: Vec<PolicyChunk> = documents
            .iter()
            .map(|doc| PolicyChunk {
                id: doc.id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                similarity: round_similarity(cosine_similarity(&query_tf, &term_frequencies(&doc.text))),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Query for top_k first, then filter: mirrors the backend contract
        // where the threshold never widens the candidate set.
        scored.truncate(top_k);
        scored.retain(|chunk| chunk.similarity >= min_similarity);

        tracing::debug!(query = query, hits = scored.len(), "Index search");
        Ok(scored)
    }

    async fn add_documents(&self, batch: Vec<PolicyDocument>) -> StoreResult<()> {
        let mut documents = self.documents.lock().unwrap();
        for doc in batch {
            if documents.iter().any(|existing| existing.id == doc.id) {
                return Err(StoreError::Duplicate(doc.id));
            }
            documents.push(doc);
        }
        Ok(())
    }

    async fn stats(&self) -> StoreResult<IndexStats> {
        let documents = self.documents.lock().unwrap();
        Ok(IndexStats {
            collection_name: "pa_policies".to_string(),
            document_count: documents.len(),
        })
    }
}

/// Lowercased word counts for a text.
fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut counts: HashMap<String, f64> = HashMap::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        *counts.entry(word.to_lowercase()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity between two term-frequency vectors. Empty vectors
/// score 0.0.
fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, count)| b.get(term).map(|other| count * other))
        .sum();
    let norm_a: f64 = a.values().map(|c| c * c).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|c| c * c).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
