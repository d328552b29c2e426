//! The store seams: artifact persistence and the best-effort vector write.

use crate::artifact::Artifact;
use crate::error::StoreError;
use async_trait::async_trait;

/// Artifact persistence.
///
/// One save per run. A rejection here is fatal to the enclosing run;
/// the pipeline does not retry and returns the store's error unchanged.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist the artifact record. Creates only; no update/delete in scope.
    async fn save(&self, artifact: &Artifact) -> Result<(), StoreError>;
}

/// Vector/embedding storage.
///
/// The pipeline's write here is fire-and-forget: a rejection is logged and
/// discarded without affecting the run's outcome. Implementations should
/// still report failures honestly; the discard decision belongs to the
/// caller.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store content under a fresh id with the parsed result as metadata.
    async fn store_embedding(
        &self,
        id: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<(), StoreError>;
}
