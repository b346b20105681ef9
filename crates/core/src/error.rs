//! Error types for the Tandem domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; pipeline failures wrap
//! them together with the stage that raised them.

use thiserror::Error;

use crate::agent::Stage;

/// The top-level error type for all Tandem operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Generation (text-generation collaborator) ---
    #[error("Generation failed: {0}")]
    Provider(#[from] ProviderError),

    // --- Retrieval collaborator ---
    #[error("Retrieval unavailable: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Pipeline-level failure, tagged with its originating stage ---
    #[error("Pipeline stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    // --- Caller errors, rejected before any stage runs ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Envelope exchange violations ---
    #[error("Envelope protocol error: {0}")]
    Protocol(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an error with the pipeline stage it came from.
    ///
    /// Already-tagged errors keep their original stage.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage that raised this error, if it was tagged.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost, untagged cause.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self.root_cause(), Error::InvalidInput(_))
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Retrieval backend unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Query embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
