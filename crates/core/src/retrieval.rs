//! Retriever trait — the context-retrieval collaborator.
//!
//! Given a query and a result limit, a retriever returns an ordered list of
//! text snippets. An empty list is a valid outcome, not an error.

use async_trait::async_trait;

use crate::error::RetrievalError;

/// The core Retriever trait.
///
/// Implementations: keyword and vector retrieval over an in-memory document
/// store, and static fixtures in tests.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The backend name (e.g., "keyword", "vector").
    fn name(&self) -> &str;

    /// Return at most `max_results` snippets, most relevant first.
    async fn retrieve(
        &self,
        query: &str,
        max_results: usize,
    ) -> std::result::Result<Vec<String>, RetrievalError>;
}
