//! The span handle: one timed, status-tagged unit of work.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Span completion status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStatus {
    /// Not yet finalized.
    Unset,
    /// The wrapped operation succeeded.
    Ok,
    /// The wrapped operation failed.
    Error {
        /// The failed operation's error message.
        message: String,
    },
}

impl SpanStatus {
    /// Shorthand for an error status.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug)]
struct SpanState {
    name: String,
    status: SpanStatus,
    attributes: BTreeMap<String, String>,
    exceptions: Vec<String>,
    end_calls: u32,
}

/// Handle to one traced operation.
///
/// Owned by the single `Tracer::trace` invocation that created it and
/// handed (cloned) to the wrapped operation so it can attach attributes.
/// All methods are safe on the no-op stand-in: they mutate local state
/// and emit nothing.
///
/// State is observable after the fact (status, attributes, end count);
/// an exporter reads it when the span ends.
#[derive(Debug, Clone)]
pub struct Span {
    state: Arc<Mutex<SpanState>>,
    recording: bool,
    payloads: bool,
}

impl Span {
    pub(crate) fn recording(name: &str, payloads: bool) -> Self {
        Self::build(name, true, payloads)
    }

    /// The no-op stand-in used when the backend cannot create real spans.
    pub(crate) fn noop(name: &str) -> Self {
        Self::build(name, false, false)
    }

    fn build(name: &str, recording: bool, payloads: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SpanState {
                name: name.to_owned(),
                status: SpanStatus::Unset,
                attributes: BTreeMap::new(),
                exceptions: Vec::new(),
                end_calls: 0,
            })),
            recording,
            payloads,
        }
    }

    /// Whether this span is the no-op stand-in.
    pub fn is_noop(&self) -> bool {
        !self.recording
    }

    /// The span's name.
    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    /// Set the completion status.
    pub fn set_status(&self, status: SpanStatus) {
        self.lock().status = status;
    }

    /// Record an exception message on the span.
    pub fn record_exception(&self, message: &str) {
        let mut state = self.lock();
        state.exceptions.push(message.to_owned());
        if self.recording {
            tracing::debug!(span = %state.name, error = message, "span recorded exception");
        }
    }

    /// Attach a key-value attribute.
    pub fn set_attribute(&self, key: impl Into<String>, value: impl ToString) {
        self.lock().attributes.insert(key.into(), value.to_string());
    }

    /// Finalize the span. `Tracer::trace` calls this exactly once per
    /// invocation; calling it again is counted but emits nothing further.
    pub fn end(&self) {
        let mut state = self.lock();
        state.end_calls += 1;
        if self.recording && state.end_calls == 1 {
            if self.payloads {
                tracing::debug!(
                    span = %state.name,
                    status = ?state.status,
                    attributes = ?state.attributes,
                    "span ended"
                );
            } else {
                tracing::debug!(span = %state.name, status = ?state.status, "span ended");
            }
        }
    }

    /// Current status.
    pub fn status(&self) -> SpanStatus {
        self.lock().status.clone()
    }

    /// Look up an attribute by key.
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.lock().attributes.get(key).cloned()
    }

    /// Exception messages recorded so far.
    pub fn exceptions(&self) -> Vec<String> {
        self.lock().exceptions.clone()
    }

    /// How many times `end` has been called.
    pub fn end_count(&self) -> u32 {
        self.lock().end_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SpanState> {
        self.state.lock().expect("span state lock poisoned")
    }
}
