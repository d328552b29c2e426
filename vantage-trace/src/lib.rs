//! Span tracer for the agent-execution pipeline.
//!
//! [`Tracer::trace`] wraps one unit of work in a [`Span`]: status is set
//! from the outcome, thrown errors are recorded and re-thrown unchanged,
//! and on every exit path a latency sample is recorded and the span is
//! ended exactly once. Observability never alters program behavior, it
//! only observes it.
//!
//! The tracer backend initializes lazily on first use through a single
//! memoized one-shot; concurrent callers await the same initialization
//! rather than re-triggering it. Initialization is best-effort: a
//! misconfigured backend degrades to no-op spans, never to a failed
//! operation.
//!
//! Span activity is also emitted as [`tracing`] events; users bring
//! their own subscriber for export.

#![deny(missing_docs)]

mod mode;
mod span;

pub use mode::{TraceMode, TRACE_ENV_KEY};
pub use span::{Span, SpanStatus};

use std::sync::Mutex;
use std::time::Instant;
use tokio::sync::OnceCell;
use vantage_core::DurationMs;

/// One recorded latency measurement: which operation, how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySample {
    /// Name of the traced operation (the agent name, for pipeline runs).
    pub agent: String,
    /// Wall-clock duration from invocation start to completion.
    pub duration: DurationMs,
}

/// The resolved tracer backend. Holds the effective mode; spans it
/// creates record when the mode says so and no-op otherwise.
#[derive(Debug)]
pub struct Backend {
    mode: TraceMode,
}

impl Backend {
    /// The mode this backend resolved to.
    pub fn mode(&self) -> TraceMode {
        self.mode
    }

    /// Start a span. In [`TraceMode::Silent`] the returned span is the
    /// no-op stand-in; its methods are safe and record nothing outward.
    pub fn start_span(&self, name: &str) -> Span {
        if self.mode == TraceMode::Silent {
            Span::noop(name)
        } else {
            tracing::debug!(span = name, "span started");
            Span::recording(name, self.mode == TraceMode::Payloads)
        }
    }
}

/// Process-level tracer handle.
///
/// Cheap to construct; the backend upgrade happens on first [`trace`]
/// (or explicit [`init`]) and is memoized for the tracer's lifetime.
///
/// [`trace`]: Tracer::trace
/// [`init`]: Tracer::init
#[derive(Debug, Default)]
pub struct Tracer {
    backend: OnceCell<Backend>,
    samples: Mutex<Vec<LatencySample>>,
    mode_override: Option<TraceMode>,
}

impl Tracer {
    /// Create a tracer whose mode resolves from the environment on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracer pinned to a mode, bypassing environment resolution.
    /// The environment variable still wins, same priority order as
    /// [`TraceMode::resolve`].
    pub fn with_mode(mode: TraceMode) -> Self {
        Self {
            backend: OnceCell::new(),
            samples: Mutex::new(Vec::new()),
            mode_override: Some(mode),
        }
    }

    /// Resolve the backend, initializing it if this is the first caller.
    /// Never fails; unknown configuration degrades with a warning.
    pub async fn init(&self) -> &Backend {
        self.backend
            .get_or_init(|| async {
                let mode = TraceMode::resolve(TRACE_ENV_KEY, self.mode_override);
                tracing::debug!(%mode, "tracer backend initialized");
                Backend { mode }
            })
            .await
    }

    /// Wrap `op` in a span named `name`.
    ///
    /// - On success: span status becomes [`SpanStatus::Ok`], the result is
    ///   returned unchanged.
    /// - On failure: the error is recorded on the span, status becomes
    ///   [`SpanStatus::Error`] with the error's message, and the original
    ///   error is returned unmodified.
    /// - On every path: one latency sample is recorded and the span is
    ///   ended exactly once.
    pub async fn trace<T, E, F, Fut>(&self, name: &str, op: F) -> Result<T, E>
    where
        F: FnOnce(Span) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let span = self.init().await.start_span(name);
        let start = Instant::now();

        let result = op(span.clone()).await;

        match &result {
            Ok(_) => span.set_status(SpanStatus::Ok),
            Err(err) => {
                let message = err.to_string();
                span.record_exception(&message);
                span.set_status(SpanStatus::error(message));
            }
        }

        // Always executes, on every exit path: sample first, then end.
        self.record_sample(LatencySample {
            agent: name.to_owned(),
            duration: start.elapsed().into(),
        });
        span.end();

        result
    }

    /// Snapshot of all latency samples recorded so far.
    pub fn latency_samples(&self) -> Vec<LatencySample> {
        self.samples.lock().expect("samples lock poisoned").clone()
    }

    fn record_sample(&self, sample: LatencySample) {
        self.samples
            .lock()
            .expect("samples lock poisoned")
            .push(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError(&'static str);

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    /// Run `op` under a fresh tracer and hand back the span it saw.
    async fn trace_and_capture<T, E>(
        tracer: &Tracer,
        name: &str,
        outcome: Result<T, E>,
    ) -> (Result<T, E>, Span)
    where
        E: std::fmt::Display,
    {
        let captured: Arc<Mutex<Option<Span>>> = Arc::new(Mutex::new(None));
        let slot = captured.clone();
        let result = tracer
            .trace(name, move |span| {
                *slot.lock().unwrap() = Some(span.clone());
                async move { outcome }
            })
            .await;
        let span = captured.lock().unwrap().take().unwrap();
        (result, span)
    }

    #[tokio::test]
    async fn success_sets_ok_status_and_returns_result_unchanged() {
        let tracer = Tracer::with_mode(TraceMode::Spans);
        let (result, span) =
            trace_and_capture(&tracer, "op", Ok::<_, TestError>("value")).await;
        assert_eq!(result.unwrap(), "value");
        assert_eq!(span.status(), SpanStatus::Ok);
        assert_eq!(span.end_count(), 1);
    }

    #[tokio::test]
    async fn error_is_rethrown_unchanged_with_error_status() {
        let tracer = Tracer::with_mode(TraceMode::Spans);
        let (result, span) =
            trace_and_capture(&tracer, "op", Err::<(), _>(TestError("boom"))).await;
        assert_eq!(result.unwrap_err().to_string(), "boom");
        assert_eq!(span.status(), SpanStatus::error("boom"));
        assert_eq!(span.exceptions(), vec!["boom".to_string()]);
        assert_eq!(span.end_count(), 1);
    }

    #[tokio::test]
    async fn silent_backend_still_runs_operation_with_noop_span() {
        let tracer = Tracer::with_mode(TraceMode::Silent);
        let (result, span) = trace_and_capture(&tracer, "op", Ok::<_, TestError>(7)).await;
        assert_eq!(result.unwrap(), 7);
        assert!(span.is_noop());
        // Safe no-ops, and finalization still happens exactly once.
        assert_eq!(span.end_count(), 1);
    }

    #[tokio::test]
    async fn latency_sample_recorded_on_success_and_failure() {
        let tracer = Tracer::with_mode(TraceMode::Spans);
        let _ = tracer
            .trace("fast", |_| async { Ok::<_, TestError>(()) })
            .await;
        let _ = tracer
            .trace("failing", |_| async { Err::<(), _>(TestError("x")) })
            .await;
        let samples = tracer.latency_samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].agent, "fast");
        assert_eq!(samples[1].agent, "failing");
    }

    #[tokio::test]
    async fn operation_can_set_attributes_through_the_span() {
        let tracer = Tracer::with_mode(TraceMode::Spans);
        let (_, span) = {
            let captured: Arc<Mutex<Option<Span>>> = Arc::new(Mutex::new(None));
            let slot = captured.clone();
            let result = tracer
                .trace("op", move |span| {
                    span.set_attribute("agent.framework", "discovery");
                    *slot.lock().unwrap() = Some(span.clone());
                    async move { Ok::<_, TestError>(()) }
                })
                .await;
            let span = captured.lock().unwrap().take().unwrap();
            (result, span)
        };
        assert_eq!(
            span.attribute("agent.framework"),
            Some("discovery".to_string())
        );
    }

    #[tokio::test]
    async fn init_is_memoized() {
        let tracer = Tracer::with_mode(TraceMode::Payloads);
        let first = tracer.init().await.mode();
        let second = tracer.init().await.mode();
        assert_eq!(first, second);
        assert_eq!(first, TraceMode::Payloads);
    }
}
