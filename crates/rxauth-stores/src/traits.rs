//! Store trait definitions for rxauth
//!
//! These traits define the capability boundaries the workflow core consumes:
//! - `PatientStore`: patient record lookup
//! - `CoverageStore`: formulary/coverage reference data keyed by (plan, drug)
//! - `PolicyIndex`: semantic search over indexed policy documents
//!
//! All traits are async and backend-agnostic. Lookups return
//! `Result<Option<T>, StoreError>`: `None` is a legitimate miss, `Err` is an
//! infrastructure failure. In-memory fakes are provided for testing via the
//! `fakes` module.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{CoverageRecord, IndexStats, Patient, PolicyChunk, PolicyDocument};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Patient record lookup.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Fetch a patient by id. `Ok(None)` when no such patient exists.
    async fn get_patient(&self, patient_id: &str) -> StoreResult<Option<Patient>>;
}

/// Formulary/coverage reference data.
///
/// Guarantees:
/// - At most one record exists per (plan, drug) pair.
/// - Drug names match case-sensitively and exactly.
/// - Records are immutable once stored.
#[async_trait]
pub trait CoverageStore: Send + Sync {
    /// Fetch the coverage record for a (plan, drug) pair, if one exists.
    async fn get_coverage(&self, plan: &str, drug: &str) -> StoreResult<Option<CoverageRecord>>;

    /// All plan names with at least one formulary entry.
    async fn list_plans(&self) -> StoreResult<Vec<String>>;

    /// All drug names appearing in any formulary.
    async fn list_drugs(&self) -> StoreResult<Vec<String>>;

    /// Covered formulary entries under one plan, capped at `limit`.
    async fn covered_drugs(&self, plan: &str, limit: usize) -> StoreResult<Vec<CoverageRecord>>;
}

/// Semantic search over indexed policy documents.
///
/// `search` queries the index for `top_k` results first and applies
/// `min_similarity` as a post-hoc filter. A high threshold combined with a
/// low `top_k` can therefore return zero results even when better matches
/// exist beyond `top_k` — accepted tradeoff, not a bug.
#[async_trait]
pub trait PolicyIndex: Send + Sync {
    /// Search for chunks relevant to `query`, ordered by descending
    /// similarity (`1 - cosine_distance`, rounded to 4 decimals).
    ///
    /// An empty index returns an empty list; "no matches" is never an error.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> StoreResult<Vec<PolicyChunk>>;

    /// Index a batch of documents. Fails on a duplicate document id.
    async fn add_documents(&self, documents: Vec<PolicyDocument>) -> StoreResult<()>;

    /// Collection statistics.
    async fn stats(&self) -> StoreResult<IndexStats>;
}
