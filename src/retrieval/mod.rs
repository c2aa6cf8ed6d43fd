//! Filtered retrieval over the vector collection.
//!
//! Embeds the question, optionally constrains the search by course code or
//! course name, and returns hits ranked by cosine similarity. Quality of the
//! result set is assessed separately by [`quality::QualityReport`].

pub mod quality;

pub use quality::QualityReport;

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{QueryFilter, SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Retrieves chunks relevant to a question, with optional metadata filtering.
pub struct FilteredRetriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl FilteredRetriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Embed the question and search the collection.
    ///
    /// An empty filter is treated the same as no filter.
    #[instrument(skip(self, question, filter))]
    pub async fn retrieve(
        &self,
        question: &str,
        filter: Option<&QueryFilter>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(question).await?;
        let effective = filter.filter(|f| !f.is_empty());
        let results = self
            .store
            .search(&query_embedding, effective, limit)
            .await?;

        debug!(
            "Retrieved {} hits (filtered: {})",
            results.len(),
            effective.is_some()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::HashEmbedder;
    use crate::vector_store::test_support::record;
    use crate::vector_store::MemoryVectorStore;

    async fn seeded_retriever() -> FilteredRetriever {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                record("a", "C10302", "Bachelor of Sport", vec![1.0; 8]),
                record("b", "C20060", "Diploma of Languages", vec![1.0; 8]),
            ])
            .await
            .unwrap();
        FilteredRetriever::new(Arc::new(store), Arc::new(HashEmbedder::new(8)))
    }

    #[tokio::test]
    async fn test_unfiltered_retrieval_sees_everything() {
        let retriever = seeded_retriever().await;
        let hits = retriever
            .retrieve("sport management courses", None, 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_constrains_results() {
        let retriever = seeded_retriever().await;
        let filter = QueryFilter::by_course_code("c20060");
        let hits = retriever
            .retrieve("language diplomas", Some(&filter), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.meta.course_code, "C20060");
    }

    #[tokio::test]
    async fn test_empty_filter_is_unfiltered() {
        let retriever = seeded_retriever().await;
        let filter = QueryFilter::default();
        let hits = retriever
            .retrieve("anything", Some(&filter), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }
}
