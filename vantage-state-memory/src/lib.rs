#![deny(missing_docs)]
//! In-memory implementations of the vantage store traits.
//!
//! `HashMap`s behind `RwLock`s for concurrent access. Suitable for
//! testing, prototyping, and single-process use cases where persistence
//! across restarts is not required.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use vantage_core::{Artifact, ArtifactStore, StoreError, VectorStore};

/// In-memory artifact store backed by a `HashMap` behind a `RwLock`,
/// keyed by artifact id.
#[derive(Default)]
pub struct MemoryArtifactStore {
    records: RwLock<HashMap<String, Artifact>>,
}

impl MemoryArtifactStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of artifacts saved.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no artifact has been saved yet.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Fetch a saved artifact by id.
    pub async fn get(&self, id: &str) -> Option<Artifact> {
        self.records.read().await.get(id).cloned()
    }

    /// All artifacts saved for a given agent, in no particular order.
    pub async fn by_agent(&self, agent: &str) -> Vec<Artifact> {
        self.records
            .read()
            .await
            .values()
            .filter(|a| a.agent == agent)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn save(&self, artifact: &Artifact) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(artifact.id.as_str().to_owned(), artifact.clone());
        Ok(())
    }
}

/// One stored embedding entry.
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// The stored content.
    pub content: String,
    /// Metadata attached to the write.
    pub metadata: serde_json::Value,
}

/// In-memory vector store. Stores raw content keyed by id; no actual
/// embedding happens here.
#[derive(Default)]
pub struct MemoryVectorStore {
    entries: RwLock<HashMap<String, VectorEntry>>,
}

impl MemoryVectorStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries written.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no entry has been written yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Fetch an entry by id.
    pub async fn get(&self, id: &str) -> Option<VectorEntry> {
        self.entries.read().await.get(id).cloned()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn store_embedding(
        &self,
        id: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            id.to_owned(),
            VectorEntry {
                content: content.to_owned(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }
}
