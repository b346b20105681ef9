//! Embedding-based retrieval.
//!
//! The query is embedded through a [`Provider`] and snippets are ranked by
//! cosine similarity against their stored embeddings. Snippets without an
//! embedding are skipped; call [`VectorRetriever::index_missing`] after loading
//! documents to fill them in.

use std::sync::Arc;

use async_trait::async_trait;
use tandem_core::error::RetrievalError;
use tandem_core::provider::{EmbeddingRequest, Provider};
use tandem_core::retrieval::Retriever;
use tracing::{debug, info};

use crate::store::DocumentStore;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]. Returns 0.0 for mismatched lengths, empty
/// input, or a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

pub struct VectorRetriever {
    store: DocumentStore,
    provider: Arc<dyn Provider>,
    model: String,
    min_score: f32,
}

impl VectorRetriever {
    pub fn new(
        store: DocumentStore,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        min_score: f32,
    ) -> Self {
        Self {
            store,
            provider,
            model: model.into(),
            min_score,
        }
    }

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let expected = inputs.len();
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs,
            })
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != expected {
            return Err(RetrievalError::EmbeddingFailed(format!(
                "expected {expected} embeddings, got {}",
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }

    /// Embed every snippet that has no embedding yet. Returns how many were indexed.
    pub async fn index_missing(&self) -> Result<usize, RetrievalError> {
        let pending: Vec<_> = self
            .store
            .snapshot()
            .await
            .into_iter()
            .filter(|s| s.embedding.is_none())
            .collect();

        if pending.is_empty() {
            return Ok(0);
        }

        let embeddings = self
            .embed(pending.iter().map(|s| s.content.clone()).collect())
            .await?;

        let mut indexed = 0;
        for (snippet, embedding) in pending.iter().zip(embeddings) {
            if self.store.set_embedding(&snippet.id, embedding).await {
                indexed += 1;
            }
        }

        info!(indexed, model = %self.model, "Indexed snippet embeddings");
        Ok(indexed)
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    fn name(&self) -> &str {
        "vector"
    }

    async fn retrieve(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, RetrievalError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let mut scored: Vec<(f32, String)> = self
            .store
            .snapshot()
            .await
            .into_iter()
            .filter_map(|snippet| {
                let emb = snippet.embedding.as_ref()?;
                let sim = cosine_similarity(emb, &query_embedding);
                (sim >= self.min_score).then_some((sim, snippet.content))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(max_results);

        debug!(hits = scored.len(), min_score = self.min_score, "Vector retrieval");

        Ok(scored.into_iter().map(|(_, content)| content).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::error::ProviderError;
    use tandem_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    /// Embeds text as [count of 'a', count of 'b'].
    struct LetterEmbedder;

    #[async_trait]
    impl Provider for LetterEmbedder {
        fn name(&self) -> &str {
            "letters"
        }

        async fn complete(&self, _: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("completion".into()))
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            let embeddings = request
                .inputs
                .iter()
                .map(|t| {
                    vec![
                        t.matches('a').count() as f32,
                        t.matches('b').count() as f32,
                    ]
                })
                .collect();
            Ok(EmbeddingResponse {
                embeddings,
                model: request.model,
            })
        }
    }

    struct NoEmbeddings;

    #[async_trait]
    impl Provider for NoEmbeddings {
        fn name(&self) -> &str {
            "none"
        }

        async fn complete(&self, _: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("completion".into()))
        }
    }

    #[test]
    fn cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn ranks_by_similarity_above_threshold() {
        let store = DocumentStore::new();
        store.add_with_embedding("mostly a", None, vec![1.0, 0.1]).await;
        store.add_with_embedding("mostly b", None, vec![0.1, 1.0]).await;
        store.add("no embedding", None).await;

        let retriever = VectorRetriever::new(store, Arc::new(LetterEmbedder), "m", 0.5);
        let hits = retriever.retrieve("aaa", 5).await.unwrap();
        assert_eq!(hits, vec!["mostly a"]);
    }

    #[tokio::test]
    async fn index_missing_fills_embeddings() {
        let store = DocumentStore::new();
        store.add("aa", None).await;
        store.add("bb", None).await;
        store.add_with_embedding("pre", None, vec![1.0, 1.0]).await;

        let retriever = VectorRetriever::new(store.clone(), Arc::new(LetterEmbedder), "m", 0.9);
        assert_eq!(retriever.index_missing().await.unwrap(), 2);
        assert_eq!(retriever.index_missing().await.unwrap(), 0);

        let hits = retriever.retrieve("b", 5).await.unwrap();
        assert_eq!(hits, vec!["bb"]);
    }

    #[tokio::test]
    async fn embedding_failure_is_reported() {
        let retriever =
            VectorRetriever::new(DocumentStore::new(), Arc::new(NoEmbeddings), "m", 0.0);
        let err = retriever.retrieve("anything", 3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingFailed(_)));
    }
}
