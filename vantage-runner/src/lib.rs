#![deny(missing_docs)]
//! The agent execution pipeline: one model call, scanned and persisted,
//! inside one span.
//!
//! [`AgentRunner::run`] orchestrates: prompt construction → model
//! invocation → response parsing with fallback → compliance scan →
//! artifact persistence → best-effort vector-store write → return of the
//! structured result. The whole run executes inside `Tracer::trace`, so
//! every run produces exactly one status-tagged span and one latency
//! sample.
//!
//! Failure semantics per step:
//! - model call, compliance scan, artifact persistence: fatal, the
//!   collaborator's error propagates unmodified
//! - missing client identifier: fatal precondition, raised before any
//!   persistence side effect
//! - unparseable model output: absorbed into a fallback result
//! - vector-store write: logged and discarded, never fatal

use std::sync::Arc;
use vantage_core::{
    AgentResult, Artifact, ArtifactStore, ClientId, ComplianceScanner, Provider, ProviderMessage,
    ProviderRequest, RunError, ScanContext, VectorStore,
};
use vantage_metrics::CounterRegistry;
use vantage_prompt::{build_prompt, framework_type_of};
use vantage_trace::Tracer;

/// Counter names the runner bumps on its injected registry.
pub mod counter {
    /// Total runs started.
    pub const RUNS: &str = "agent.runs";
    /// Runs whose model output fell back to the unparsed-response shape.
    pub const FALLBACKS: &str = "agent.fallbacks";
    /// Input tokens consumed across runs.
    pub const TOKENS_IN: &str = "agent.tokens_in";
    /// Output tokens generated across runs.
    pub const TOKENS_OUT: &str = "agent.tokens_out";
    /// Vector-store writes that failed and were discarded.
    pub const VECTOR_WRITE_FAILURES: &str = "vector.write_failures";
}

/// Static configuration for an AgentRunner instance.
pub struct RunnerConfig {
    /// Model identifier sent with every request. Empty = provider default.
    pub model: String,
    /// Sampling temperature sent with every request.
    pub temperature: f64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
        }
    }
}

/// The execution pipeline.
///
/// Generic over `P: Provider` (not object-safe); the scanner and stores
/// are object-safe seams taken by `Arc`. The tracer and counter registry
/// are injected so callers share one process-wide pair while tests
/// instantiate isolated ones.
pub struct AgentRunner<P: Provider> {
    provider: P,
    scanner: Arc<dyn ComplianceScanner>,
    artifacts: Arc<dyn ArtifactStore>,
    vectors: Arc<dyn VectorStore>,
    tracer: Arc<Tracer>,
    counters: Arc<CounterRegistry>,
    config: RunnerConfig,
}

impl<P: Provider> AgentRunner<P> {
    /// Create a runner over the given collaborators with a fresh tracer
    /// and counter registry.
    pub fn new(
        provider: P,
        scanner: Arc<dyn ComplianceScanner>,
        artifacts: Arc<dyn ArtifactStore>,
        vectors: Arc<dyn VectorStore>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            provider,
            scanner,
            artifacts,
            vectors,
            tracer: Arc::new(Tracer::new()),
            counters: Arc::new(CounterRegistry::new()),
            config,
        }
    }

    /// Share a tracer with the rest of the process.
    pub fn with_tracer(mut self, tracer: Arc<Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Share a counter registry with the rest of the process.
    pub fn with_counters(mut self, counters: Arc<CounterRegistry>) -> Self {
        self.counters = counters;
        self
    }

    /// The runner's counter registry.
    pub fn counters(&self) -> &Arc<CounterRegistry> {
        &self.counters
    }

    /// The runner's tracer.
    pub fn tracer(&self) -> &Arc<Tracer> {
        &self.tracer
    }

    /// Run `agent_name` over `input` with no tools configuration.
    pub async fn run(
        &self,
        agent_name: &str,
        input: serde_json::Value,
    ) -> Result<AgentResult, RunError> {
        self.run_with_tools(agent_name, input, serde_json::Value::Null)
            .await
    }

    /// Run `agent_name` over `input`. `tools_config` passes through to the
    /// provider request unchanged.
    pub async fn run_with_tools(
        &self,
        agent_name: &str,
        input: serde_json::Value,
        tools_config: serde_json::Value,
    ) -> Result<AgentResult, RunError> {
        self.counters.increment(counter::RUNS);

        // Absent input behaves as an empty payload.
        let input = if input.is_null() {
            serde_json::json!({})
        } else {
            input
        };

        self.tracer
            .trace(agent_name, |span| async move {
                span.set_attribute("agent.name", agent_name);
                span.set_attribute("agent.framework", framework_type_of(agent_name));

                let prompt = build_prompt(agent_name, &input);
                let request = ProviderRequest {
                    model: if self.config.model.is_empty() {
                        None
                    } else {
                        Some(self.config.model.clone())
                    },
                    messages: vec![ProviderMessage::user(prompt)],
                    max_tokens: None,
                    temperature: Some(self.config.temperature),
                    extra: tools_config,
                };

                // Fatal: no retry, no fallback.
                let response = self.provider.complete(request).await?;

                span.set_attribute("gen_ai.usage.input_tokens", response.usage.input_tokens);
                span.set_attribute("gen_ai.usage.output_tokens", response.usage.output_tokens);
                self.counters
                    .increment_by(counter::TOKENS_IN, response.usage.input_tokens as i64);
                self.counters
                    .increment_by(counter::TOKENS_OUT, response.usage.output_tokens as i64);

                // Parse failure is never fatal.
                let result = AgentResult::from_raw(&response.content);
                if result.is_fallback() {
                    self.counters.increment(counter::FALLBACKS);
                    tracing::warn!(agent = agent_name, "model output was not structured JSON");
                }

                // Scan the raw response, not the parsed result. A scanner
                // failure is fatal: nothing unredacted may be persisted.
                let ctx = ScanContext {
                    client: ClientId::resolve(&input),
                    agent: agent_name.to_owned(),
                };
                let outcome = self.scanner.scan(&response.content, &ctx).await?;
                let stored = outcome.stored_content(&response.content).to_owned();

                // Fatal precondition: no artifact without attribution.
                let client = ClientId::resolve(&input).ok_or(RunError::MissingClient)?;

                let artifact = Artifact::new(agent_name, client, stored.clone(), result.as_value());
                self.artifacts.save(&artifact).await?;

                // Best-effort: the write's outcome is inspected, logged,
                // and discarded. It never changes the run's result.
                let embedding_id = format!("emb-{}", uuid::Uuid::new_v4().simple());
                if let Err(err) = self
                    .vectors
                    .store_embedding(&embedding_id, &stored, result.as_value())
                    .await
                {
                    self.counters.increment(counter::VECTOR_WRITE_FAILURES);
                    tracing::warn!(
                        agent = agent_name,
                        error = %err,
                        "vector-store write failed; run continues"
                    );
                }

                Ok(result)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use vantage_core::{
        ProviderError, ProviderResponse, ScanError, ScanOutcome, StoreError, TokenUsage,
    };
    use vantage_state_memory::{MemoryArtifactStore, MemoryVectorStore};

    // -- Mock Provider --

    struct MockProvider {
        responses: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl MockProvider {
        fn new(responses: Vec<ProviderResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).collect()),
                requests: Mutex::new(vec![]),
            }
        }

        fn with_error(error: ProviderError) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([Err(error)])),
                requests: Mutex::new(vec![]),
            }
        }

        fn returning_text(text: &str) -> Self {
            Self::new(vec![text_response(text)])
        }
    }

    impl Provider for MockProvider {
        fn complete(
            &self,
            request: ProviderRequest,
        ) -> impl std::future::Future<Output = Result<ProviderResponse, ProviderError>> + Send
        {
            self.requests.lock().unwrap().push(request);
            let result = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("MockProvider: no more responses queued");
            async move { result }
        }
    }

    fn text_response(text: &str) -> ProviderResponse {
        ProviderResponse {
            content: text.to_string(),
            model: "mock-model".into(),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
        }
    }

    // -- Mock scanner / stores --

    struct FixedScanner {
        outcome: Result<ScanOutcome, String>,
        calls: AtomicUsize,
    }

    impl FixedScanner {
        fn clean() -> Self {
            Self {
                outcome: Ok(ScanOutcome::clean()),
                calls: AtomicUsize::new(0),
            }
        }

        fn redacting(text: &str) -> Self {
            Self {
                outcome: Ok(ScanOutcome::redacted(text)),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                outcome: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ComplianceScanner for FixedScanner {
        async fn scan(&self, _content: &str, _ctx: &ScanContext) -> Result<ScanOutcome, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(outcome) => Ok(outcome.clone()),
                Err(message) => Err(ScanError::Failed(message.clone())),
            }
        }
    }

    struct FailingArtifactStore {
        message: &'static str,
    }

    #[async_trait]
    impl ArtifactStore for FailingArtifactStore {
        async fn save(&self, _artifact: &Artifact) -> Result<(), StoreError> {
            Err(StoreError::Other(self.message.into()))
        }
    }

    struct FailingVectorStore;

    #[async_trait]
    impl VectorStore for FailingVectorStore {
        async fn store_embedding(
            &self,
            _id: &str,
            _content: &str,
            _metadata: &serde_json::Value,
        ) -> Result<(), StoreError> {
            Err(StoreError::WriteFailed("vector backend offline".into()))
        }
    }

    // -- Helpers --

    struct Harness {
        runner: AgentRunner<MockProvider>,
        artifacts: Arc<MemoryArtifactStore>,
        vectors: Arc<MemoryVectorStore>,
        scanner: Arc<FixedScanner>,
    }

    fn harness(provider: MockProvider, scanner: FixedScanner) -> Harness {
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let vectors = Arc::new(MemoryVectorStore::new());
        let scanner = Arc::new(scanner);
        let runner = AgentRunner::new(
            provider,
            scanner.clone(),
            artifacts.clone(),
            vectors.clone(),
            RunnerConfig::default(),
        );
        Harness {
            runner,
            artifacts,
            vectors,
            scanner,
        }
    }

    // -- Tests --

    #[tokio::test]
    async fn structured_response_returns_parsed_result_and_persists_artifact() {
        let h = harness(
            MockProvider::returning_text(r#"{"success":true,"result":"R"}"#),
            FixedScanner::clean(),
        );
        let result = h
            .runner
            .run("testAgent", json!({"test": "data", "clientId": "c1"}))
            .await
            .unwrap();

        assert_eq!(result.as_value()["success"], json!(true));
        assert_eq!(result.as_value()["result"], json!("R"));

        let saved = h.artifacts.by_agent("testAgent").await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].client, ClientId::new("c1"));
        assert_eq!(saved[0].metadata["clientId"], json!("c1"));
        assert_eq!(saved[0].content, r#"{"success":true,"result":"R"}"#);
    }

    #[tokio::test]
    async fn unparseable_response_resolves_with_fallback() {
        let h = harness(
            MockProvider::returning_text("not json"),
            FixedScanner::clean(),
        );
        let result = h
            .runner
            .run("testAgent", json!({"clientId": "c1"}))
            .await
            .unwrap();

        assert!(result.is_fallback());
        assert_eq!(result.as_value()["status"], json!("completed_with_fallback"));
        assert_eq!(result.as_value()["rawResponse"], json!("not json"));
        assert_eq!(h.runner.counters().get(counter::FALLBACKS), 1);
        // The fallback run still persists its artifact.
        assert_eq!(h.artifacts.len().await, 1);
    }

    #[tokio::test]
    async fn missing_client_rejects_before_any_persistence() {
        let h = harness(
            MockProvider::returning_text(r#"{"ok":true}"#),
            FixedScanner::clean(),
        );
        let err = h.runner.run("a", json!({"test": "data"})).await.unwrap_err();

        assert!(matches!(err, RunError::MissingClient));
        assert!(h.artifacts.is_empty().await);
        assert!(h.vectors.is_empty().await);
    }

    #[tokio::test]
    async fn bare_string_input_resolves_as_client() {
        let h = harness(
            MockProvider::returning_text(r#"{"ok":true}"#),
            FixedScanner::clean(),
        );
        h.runner.run("a", json!("c9")).await.unwrap();
        let saved = h.artifacts.by_agent("a").await;
        assert_eq!(saved[0].client, ClientId::new("c9"));
    }

    #[tokio::test]
    async fn vector_store_failure_is_not_fatal() {
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let runner = AgentRunner::new(
            MockProvider::returning_text(r#"{"ok":true}"#),
            Arc::new(FixedScanner::clean()),
            artifacts.clone(),
            Arc::new(FailingVectorStore),
            RunnerConfig::default(),
        );

        let result = runner.run("a", json!({"clientId": "c"})).await.unwrap();
        assert_eq!(result.as_value()["ok"], json!(true));
        assert_eq!(artifacts.len().await, 1);
        assert_eq!(runner.counters().get(counter::VECTOR_WRITE_FAILURES), 1);
    }

    #[tokio::test]
    async fn redacted_content_wins_for_persistence() {
        let h = harness(
            MockProvider::returning_text(r#"{"ok":true}"#),
            FixedScanner::redacting("X"),
        );
        let result = h.runner.run("a", json!({"clientId": "c"})).await.unwrap();

        let saved = h.artifacts.by_agent("a").await;
        assert_eq!(saved[0].content, "X");
        // The returned result is still the parsed response.
        assert_eq!(result.as_value()["ok"], json!(true));
        // The vector write stores the redacted text too.
        assert_eq!(h.vectors.len().await, 1);
    }

    #[tokio::test]
    async fn persistence_failure_propagates_verbatim() {
        let runner = AgentRunner::new(
            MockProvider::returning_text(r#"{"ok":true}"#),
            Arc::new(FixedScanner::clean()),
            Arc::new(FailingArtifactStore { message: "db down" }),
            Arc::new(MemoryVectorStore::new()),
            RunnerConfig::default(),
        );
        let err = runner.run("a", json!({"clientId": "c"})).await.unwrap_err();
        assert_eq!(err.to_string(), "db down");
    }

    #[tokio::test]
    async fn scanner_failure_is_fatal_and_blocks_persistence() {
        let h = harness(
            MockProvider::returning_text(r#"{"ok":true}"#),
            FixedScanner::failing("policy service unreachable"),
        );
        let err = h.runner.run("a", json!({"clientId": "c"})).await.unwrap_err();

        assert!(matches!(err, RunError::Compliance(_)));
        assert!(err.to_string().contains("policy service unreachable"));
        assert!(h.artifacts.is_empty().await);
    }

    #[tokio::test]
    async fn model_failure_propagates_and_skips_scan() {
        let h = harness(
            MockProvider::with_error(ProviderError::RequestFailed("timeout".into())),
            FixedScanner::clean(),
        );
        let err = h.runner.run("a", json!({"clientId": "c"})).await.unwrap_err();

        assert!(matches!(err, RunError::Model(_)));
        assert_eq!(h.scanner.calls.load(Ordering::SeqCst), 0);
        assert!(h.artifacts.is_empty().await);
    }

    #[tokio::test]
    async fn request_carries_prompt_model_and_temperature() {
        let provider = MockProvider::returning_text(r#"{"ok":true}"#);
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let runner = AgentRunner::new(
            provider,
            Arc::new(FixedScanner::clean()),
            artifacts,
            Arc::new(MemoryVectorStore::new()),
            RunnerConfig {
                model: "gpt-4o-mini".into(),
                temperature: 0.2,
            },
        );
        runner
            .run("research", json!({"clientId": "c", "idea": "meal kits"}))
            .await
            .unwrap();

        let requests = runner.provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(requests[0].messages.len(), 1);
        assert!(requests[0].messages[0].content.contains("meal kits"));
        assert!(requests[0].messages[0].content.contains("research agent"));
    }

    #[tokio::test]
    async fn tools_config_passes_through_to_request_extra() {
        let h = harness(
            MockProvider::returning_text(r#"{"ok":true}"#),
            FixedScanner::clean(),
        );
        h.runner
            .run_with_tools("a", json!({"clientId": "c"}), json!({"web_search": true}))
            .await
            .unwrap();

        let requests = h.runner.provider.requests.lock().unwrap();
        assert_eq!(requests[0].extra, json!({"web_search": true}));
    }

    #[tokio::test]
    async fn run_records_span_and_counters() {
        let h = harness(
            MockProvider::returning_text(r#"{"ok":true}"#),
            FixedScanner::clean(),
        );
        h.runner.run("research", json!({"clientId": "c"})).await.unwrap();

        let samples = h.runner.tracer().latency_samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].agent, "research");

        let counters = h.runner.counters().snapshot();
        assert_eq!(counters[counter::RUNS], 1);
        assert_eq!(counters[counter::TOKENS_IN], 10);
        assert_eq!(counters[counter::TOKENS_OUT], 5);
    }

    #[tokio::test]
    async fn null_input_normalizes_to_empty_payload() {
        let h = harness(
            MockProvider::returning_text(r#"{"ok":true}"#),
            FixedScanner::clean(),
        );
        // Empty payload carries no client id, so the run fails the
        // precondition, but only after the prompt was built from `{}`.
        let err = h.runner.run("a", serde_json::Value::Null).await.unwrap_err();
        assert!(matches!(err, RunError::MissingClient));

        let requests = h.runner.provider.requests.lock().unwrap();
        assert!(requests[0].messages[0].content.contains("{}"));
    }

    #[tokio::test]
    async fn concurrent_runs_are_independent() {
        let provider = MockProvider::new(vec![
            text_response(r#"{"n":1}"#),
            text_response(r#"{"n":2}"#),
        ]);
        let h = harness(provider, FixedScanner::clean());

        let (a, b) = tokio::join!(
            h.runner.run("analysis", json!({"clientId": "c1"})),
            h.runner.run("synthesis", json!({"clientId": "c2"})),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(h.artifacts.len().await, 2);
        assert_eq!(h.runner.counters().get(counter::RUNS), 2);
        assert_eq!(h.runner.tracer().latency_samples().len(), 2);
    }
}
