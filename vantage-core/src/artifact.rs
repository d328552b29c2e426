//! The agent result and the persisted artifact record.

use crate::id::{ArtifactId, ClientId};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Status marker carried by a fallback-constructed [`AgentResult`].
pub const FALLBACK_STATUS: &str = "completed_with_fallback";

/// The structured output of one agent invocation.
///
/// Either the JSON object the model returned, or, when the raw response
/// is not a JSON object, a fallback structure embedding the raw text,
/// deterministic remediation hints, and `status: "completed_with_fallback"`.
/// Construction never fails; malformed model output is absorbed, not
/// propagated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentResult(serde_json::Value);

impl AgentResult {
    /// Parse the raw model response. Anything that is not a JSON object
    /// (parse failures included) produces the fallback structure.
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) if value.is_object() => Self(value),
            _ => Self::fallback(raw),
        }
    }

    /// Build the fallback result around an unparseable raw response.
    pub fn fallback(raw: &str) -> Self {
        Self(serde_json::json!({
            "analysis": "The agent response could not be parsed as structured JSON.",
            "recommendations": [
                "Review the raw response manually",
                "Re-run the agent with a stricter output instruction",
            ],
            "nextSteps": [],
            "insights": [],
            "rawResponse": raw,
            "status": FALLBACK_STATUS,
        }))
    }

    /// Whether this result was built through the fallback path.
    pub fn is_fallback(&self) -> bool {
        self.0.get("status").and_then(|v| v.as_str()) == Some(FALLBACK_STATUS)
            && self.0.get("rawResponse").is_some()
    }

    /// Borrow the underlying JSON object.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consume into the underlying JSON object.
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

/// Current epoch time in milliseconds.
fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The persisted record of one completed agent invocation.
///
/// Exactly one artifact is created per successful run. The content field
/// holds the post-redaction text; the metadata field holds the parsed
/// result merged with the owning client id.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Generated identifier: agent name + timestamp + random suffix.
    pub id: ArtifactId,
    /// Owning client. Required; creation fails upstream without it.
    pub client: ClientId,
    /// Display name.
    pub name: String,
    /// Fixed type marker.
    pub kind: String,
    /// Fixed status marker.
    pub status: String,
    /// Originating agent identifier.
    pub agent: String,
    /// Post-compliance-redaction text.
    pub content: String,
    /// The parsed result merged with the client identifier.
    pub metadata: serde_json::Value,
    /// Creation timestamp, epoch milliseconds.
    pub created_at: u64,
}

impl Artifact {
    /// Build an artifact for one completed run of `agent` on behalf of
    /// `client`. The result value is merged with the client id to form
    /// the metadata.
    pub fn new(
        agent: &str,
        client: ClientId,
        content: impl Into<String>,
        result: &serde_json::Value,
    ) -> Self {
        let mut metadata = result.clone();
        if let serde_json::Value::Object(map) = &mut metadata {
            map.insert(
                "clientId".to_owned(),
                serde_json::Value::String(client.as_str().to_owned()),
            );
        }
        Self {
            id: ArtifactId::generate(agent),
            name: format!("{agent} output"),
            kind: "agent_output".to_owned(),
            status: "complete".to_owned(),
            agent: agent.to_owned(),
            content: content.into(),
            metadata,
            created_at: epoch_millis(),
            client,
        }
    }
}

impl ArtifactId {
    /// Generate a fresh artifact id: `{agent}-{epoch_ms}-{suffix}`.
    pub fn generate(agent: &str) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self::new(format!("{agent}-{}-{}", epoch_millis(), &suffix[..8]))
    }
}
