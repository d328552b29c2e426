//! The compliance seam: content classification and redaction before
//! persistence.
//!
//! One canonical interface: [`ComplianceScanner::scan`]. The legacy
//! collaborator exposed two method shapes with two return shapes
//! (`{isCompliant, redactedContent}` vs `{content}`); integrations with
//! that service normalize at the edge via [`ScanOutcome::from_legacy`]
//! instead of probing method names at every call site.

use crate::error::ScanError;
use crate::id::ClientId;
use async_trait::async_trait;

/// Context handed to a scan. The client id is optional because the scan
/// runs before the pipeline's fatal client-id check.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    /// Client the content will be attributed to, when already resolvable.
    pub client: Option<ClientId>,
    /// Agent that produced the content.
    pub agent: String,
}

impl ScanContext {
    /// Create a context for the given agent.
    pub fn for_agent(agent: impl Into<String>) -> Self {
        Self {
            client: None,
            agent: agent.into(),
        }
    }
}

/// The result of a compliance scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Whether the content passed classification.
    pub compliant: bool,
    /// Replacement text to persist instead of the original, if the
    /// scanner produced one.
    pub redacted: Option<String>,
}

impl ScanOutcome {
    /// Content passed untouched.
    pub fn clean() -> Self {
        Self {
            compliant: true,
            redacted: None,
        }
    }

    /// Content was redacted; the replacement text must be persisted.
    pub fn redacted(text: impl Into<String>) -> Self {
        Self {
            compliant: false,
            redacted: Some(text.into()),
        }
    }

    /// The text to persist: the redacted replacement when present,
    /// otherwise the original.
    pub fn stored_content<'a>(&'a self, original: &'a str) -> &'a str {
        self.redacted.as_deref().unwrap_or(original)
    }

    /// Normalize a legacy scanner response.
    ///
    /// The old service returned either `{isCompliant, redactedContent}` or
    /// `{content}`. Preference order: `redactedContent`, then `content`,
    /// else fall through to the original text (no replacement).
    pub fn from_legacy(value: &serde_json::Value) -> Self {
        let compliant = value
            .get("isCompliant")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        let redacted = value
            .get("redactedContent")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("content").and_then(|v| v.as_str()))
            .map(str::to_owned);
        Self { compliant, redacted }
    }
}

/// Compliance scanner interface.
///
/// A failed scan is fatal to the enclosing run; content must not reach
/// the artifact store unredacted. Scanners therefore return `Err` only
/// when they could not classify, never to signal "not compliant" (that is
/// what [`ScanOutcome::compliant`] is for).
#[async_trait]
pub trait ComplianceScanner: Send + Sync {
    /// Classify the content and optionally produce a redacted replacement.
    async fn scan(&self, content: &str, ctx: &ScanContext) -> Result<ScanOutcome, ScanError>;
}
