//! In-memory snippet store shared by the retrievers.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

/// A stored text snippet.
#[derive(Debug, Clone)]
pub struct StoredSnippet {
    pub id: String,
    pub content: String,
    /// Where the snippet came from (file name, upload id, ...)
    pub source: Option<String>,
    /// Embedding vector, when vector retrieval is in use
    pub embedding: Option<Vec<f32>>,
}

/// A cheaply clonable handle to a list of snippets.
///
/// Insertion order is preserved; retrievers use it to break score ties.
#[derive(Clone, Default)]
pub struct DocumentStore {
    snippets: Arc<RwLock<Vec<StoredSnippet>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snippet and return its generated id.
    pub async fn add(&self, content: impl Into<String>, source: Option<String>) -> String {
        self.insert(content.into(), source, None).await
    }

    /// Add a snippet that already has an embedding.
    pub async fn add_with_embedding(
        &self,
        content: impl Into<String>,
        source: Option<String>,
        embedding: Vec<f32>,
    ) -> String {
        self.insert(content.into(), source, Some(embedding)).await
    }

    async fn insert(
        &self,
        content: String,
        source: Option<String>,
        embedding: Option<Vec<f32>>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.snippets.write().await.push(StoredSnippet {
            id: id.clone(),
            content,
            source,
            embedding,
        });
        id
    }

    /// Attach an embedding to an existing snippet. Returns false if the id is unknown.
    pub async fn set_embedding(&self, id: &str, embedding: Vec<f32>) -> bool {
        let mut snippets = self.snippets.write().await;
        match snippets.iter_mut().find(|s| s.id == id) {
            Some(snippet) => {
                snippet.embedding = Some(embedding);
                true
            }
            None => false,
        }
    }

    /// A point-in-time copy of all snippets.
    pub async fn snapshot(&self) -> Vec<StoredSnippet> {
        self.snippets.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.snippets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snippets.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.snippets.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_preserves_order() {
        let store = DocumentStore::new();
        store.add("first", None).await;
        store.add("second", Some("b.md".into())).await;

        let all = store.snapshot().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "first");
        assert_eq!(all[1].source.as_deref(), Some("b.md"));
    }

    #[tokio::test]
    async fn clones_share_contents() {
        let store = DocumentStore::new();
        let handle = store.clone();
        handle.add("shared", None).await;
        assert_eq!(store.len().await, 1);

        store.clear().await;
        assert!(handle.is_empty().await);
    }

    #[tokio::test]
    async fn set_embedding_on_known_id_only() {
        let store = DocumentStore::new();
        let id = store.add("text", None).await;

        assert!(store.set_embedding(&id, vec![1.0, 0.0]).await);
        assert!(!store.set_embedding("missing", vec![0.0]).await);
        assert_eq!(store.snapshot().await[0].embedding, Some(vec![1.0, 0.0]));
    }
}
