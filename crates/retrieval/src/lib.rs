//! Context retrieval backends for Tandem.
//!
//! Every retriever reads from a shared in-memory [`DocumentStore`] and
//! implements `tandem_core::Retriever`.

pub mod keyword;
pub mod loader;
pub mod store;
pub mod vector;

pub use keyword::KeywordRetriever;
pub use loader::{load_documents, split_paragraphs};
pub use store::{DocumentStore, StoredSnippet};
pub use vector::{VectorRetriever, cosine_similarity};
