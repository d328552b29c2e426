//! Error types for each seam.
//!
//! Every enum carries an `Other(Box<dyn Error>)` catch-all that displays
//! the inner message verbatim. Collaborator failures cross the pipeline
//! unchanged in message: the tracer and runner observe errors, they never
//! rewrite them.

use thiserror::Error;

/// Errors from LLM providers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication/authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// Could not parse the provider's response envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Compliance scanner errors. A scanner failure is fatal to the run;
/// content must not be persisted unredacted.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan itself failed.
    #[error("scan failed: {0}")]
    Failed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Artifact and vector store errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Pipeline errors. Each variant is one of the terminal failure states of
/// a run; the wrapped collaborator error displays as-is so callers see the
/// original message.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RunError {
    /// The model call failed. No retry, no fallback.
    #[error("{0}")]
    Model(#[from] ProviderError),

    /// The compliance scan failed.
    #[error("{0}")]
    Compliance(#[from] ScanError),

    /// No client identifier could be resolved from the input. Raised
    /// before any persistence side effect.
    #[error("missing client identifier: input must carry clientId, id, or be a bare string")]
    MissingClient,

    /// Persisting the artifact failed.
    #[error("{0}")]
    Persist(#[from] StoreError),
}
