//! # vantage-core: protocol traits for the traced agent-execution core
//!
//! This crate defines the collaborator seams and shared types that the
//! execution pipeline composes:
//!
//! | Seam | Trait | What it does |
//! |------|-------|-------------|
//! | Model | [`Provider`] | One completion call against an LLM backend |
//! | Compliance | [`ComplianceScanner`] | Classify + optionally redact content before persistence |
//! | Artifacts | [`ArtifactStore`] | Persist the record of one agent invocation |
//! | Vectors | [`VectorStore`] | Best-effort embedding write, keyed by id |
//!
//! ## Design principle
//!
//! Every trait is operation-defined, not mechanism-defined. `scan` means
//! "decide what may be persisted", not "call service X". That is what
//! makes a regex scanner, an HTTP policy service, and a test double all
//! implement the same seam.
//!
//! ## Dependency notes
//!
//! `serde_json::Value` is the interchange type for agent inputs, parsed
//! results, and artifact metadata. JSON is what the model speaks and what
//! the artifact record stores; a generic `T: Serialize` would complicate
//! object safety at the store seams without practical benefit.

#![deny(missing_docs)]

pub mod artifact;
pub mod duration;
pub mod error;
pub mod id;
pub mod provider;
pub mod scanner;
pub mod store;

// Re-exports for convenience
pub use artifact::{AgentResult, Artifact, FALLBACK_STATUS};
pub use duration::DurationMs;
pub use error::{ProviderError, RunError, ScanError, StoreError};
pub use id::{ArtifactId, ClientId};
pub use provider::{
    Provider, ProviderMessage, ProviderRequest, ProviderResponse, Role, TokenUsage,
};
pub use scanner::{ComplianceScanner, ScanContext, ScanOutcome};
pub use store::{ArtifactStore, VectorStore};
