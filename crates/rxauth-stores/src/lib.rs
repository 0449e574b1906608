//! rxauth-stores: data model and store capability traits (Layer 0)
//!
//! Defines the record types and the three capability boundaries the
//! prior-authorization workflow core consumes:
//!
//! - [`PatientStore`] — patient record lookup
//! - [`CoverageStore`] — formulary reference data keyed by (plan, drug)
//! - [`PolicyIndex`] — semantic search over indexed policy documents
//!
//! Production backends (relational store, vector database) live behind
//! these traits and are out of scope here; the `fakes` module provides
//! deterministic in-memory implementations for tests and demos.

pub mod chunking;
pub mod error;
pub mod fakes;
pub mod model;
pub mod traits;

pub use chunking::chunk_document;
pub use error::StoreError;
pub use model::{
    coverage_key, round_similarity, CoverageRecord, Diagnosis, IndexStats, LabResults, Patient,
    PolicyChunk, PolicyDocument, PolicyMetadata, TreatmentHistory, ValidationError,
};
pub use traits::{CoverageStore, PatientStore, PolicyIndex, StoreResult};
