//! Typed ID wrappers for client and artifact identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up client ids and artifact ids.
/// These are just strings underneath: no UUID enforcement, no format
/// requirement. The protocol doesn't care what your IDs look like.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(ClientId, "Identifier of the client an artifact belongs to.");
typed_id!(ArtifactId, "Unique identifier for a persisted artifact.");

impl ClientId {
    /// Resolve a client id from an agent input payload.
    ///
    /// Accepts, in order of preference:
    /// 1. an object with a non-empty string `clientId` field,
    /// 2. an object with a non-empty string `id` field,
    /// 3. a bare non-empty JSON string.
    ///
    /// Returns `None` for everything else. The pipeline treats `None` as a
    /// fatal precondition failure; no artifact without attribution.
    pub fn resolve(input: &serde_json::Value) -> Option<Self> {
        match input {
            serde_json::Value::String(s) if !s.is_empty() => Some(Self::new(s.clone())),
            serde_json::Value::Object(map) => map
                .get("clientId")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    map.get("id")
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.is_empty())
                })
                .map(Self::new),
            _ => None,
        }
    }
}
