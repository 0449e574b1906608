//! Policy retrieval over the vector index capability.

use std::sync::Arc;

use tracing::debug;

use rxauth_stores::{IndexStats, PolicyChunk, PolicyIndex};

use crate::error::Result;

/// Thin retrieval component over the [`PolicyIndex`] capability.
///
/// The index is queried for `top_k` candidates first; `min_similarity`
/// filters post-hoc. "No matches" is an empty list, never an error.
pub struct PolicyRetriever {
    index: Arc<dyn PolicyIndex>,
}

impl PolicyRetriever {
    pub fn new(index: Arc<dyn PolicyIndex>) -> Self {
        Self { index }
    }

    /// Search for policy chunks relevant to `query`, ordered by descending
    /// similarity.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<PolicyChunk>> {
        let chunks = self.index.search(query, top_k, min_similarity).await?;
        debug!(query = query, hits = chunks.len(), "Policy search");
        Ok(chunks)
    }

    /// Index statistics, for ops surfaces.
    pub async fn stats(&self) -> Result<IndexStats> {
        Ok(self.index.stats().await?)
    }
}
