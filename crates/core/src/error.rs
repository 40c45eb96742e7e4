//! Error types for the Tribuna domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Tribuna operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Knowledge store errors ---
    #[error("Knowledge store error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The model produced output that is neither a final answer nor a
    /// well-formed tool call. `raw` holds whatever text it did generate.
    #[error("Model output could not be parsed")]
    MalformedOutput { raw: String },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Similarity query failed: {0}")]
    Query(String),

    #[error("Clearing the knowledge base failed: {0}")]
    Clear(String),

    #[error("Inserting chunks failed: {0}")]
    Insert(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    /// Planning mistakes the model can correct on its next step, as opposed
    /// to backend failures that end the turn.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ToolError::NotFound(_) | ToolError::InvalidArguments(_))
    }
}
