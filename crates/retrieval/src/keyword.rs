//! Keyword retriever — term-overlap scoring, no external calls.

use async_trait::async_trait;
use tandem_core::error::RetrievalError;
use tandem_core::retrieval::Retriever;
use tracing::debug;

use crate::store::DocumentStore;

/// Terms shorter than this are ignored on both sides.
const MIN_TERM_LEN: usize = 2;

/// Scores each snippet by how often the query's terms occur in it,
/// normalized by snippet length.
pub struct KeywordRetriever {
    store: DocumentStore,
}

impl KeywordRetriever {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }
}

/// Lowercase alphanumeric terms of at least [`MIN_TERM_LEN`] characters.
pub(crate) fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .map(str::to_lowercase)
        .collect()
}

fn score(query_terms: &[String], content: &str) -> f32 {
    let content_terms = terms(content);
    if content_terms.is_empty() {
        return 0.0;
    }

    let hits = content_terms
        .iter()
        .filter(|t| query_terms.contains(t))
        .count();

    hits as f32 / (content_terms.len() as f32 / 100.0).max(1.0)
}

#[async_trait]
impl Retriever for KeywordRetriever {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn retrieve(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, RetrievalError> {
        let mut query_terms = terms(query);
        query_terms.sort();
        query_terms.dedup();

        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, String)> = self
            .store
            .snapshot()
            .await
            .into_iter()
            .map(|s| (score(&query_terms, &s.content), s.content))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(max_results);

        debug!(query_terms = query_terms.len(), hits = scored.len(), "Keyword retrieval");

        Ok(scored.into_iter().map(|(_, content)| content).collect())
    }
}
