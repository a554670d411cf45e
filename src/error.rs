//! Domain error taxonomy.
//!
//! Every fallible operation in the crate surfaces one of these variants so
//! that callers (HTTP layer, CLI) can map failures to machine-readable codes
//! without string matching. Store and metrics mutations are total and never
//! produce errors; the documented skip policies (duplicate triples, short
//! rows) are not failures.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    /// Empty or malformed required input: blank query or text, rating out of
    /// range, missing filename, empty row batch.
    #[error("{0}")]
    Validation(String),

    /// Ranking was attempted while the store holds no nodes.
    #[error("knowledge graph is empty, nothing to rank")]
    EmptyGraph,

    /// Node lookup with an empty identifier.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure during text or row ingestion, carrying the cause.
    /// In-flight job counters are guaranteed to be unwound before this
    /// surfaces.
    #[error("ingestion failed: {0}")]
    Ingestion(anyhow::Error),

    /// The embedding provider did not answer within the configured bound.
    #[error("embedding timed out after {0:?}")]
    EmbeddingTimeout(Duration),

    /// The embedding provider failed (disabled, API error, retries exhausted).
    #[error("embedding failed: {0}")]
    Embedding(anyhow::Error),
}

impl GraphError {
    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::Validation(_) => "bad_request",
            GraphError::EmptyGraph | GraphError::NotFound(_) => "not_found",
            GraphError::Ingestion(_) => "ingestion_error",
            GraphError::EmbeddingTimeout(_) => "timeout",
            GraphError::Embedding(_) => "embedding_error",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        GraphError::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(GraphError::validation("x").code(), "bad_request");
        assert_eq!(GraphError::EmptyGraph.code(), "not_found");
        assert_eq!(
            GraphError::EmbeddingTimeout(Duration::from_secs(30)).code(),
            "timeout"
        );
    }
}
