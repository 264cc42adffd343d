//! Workflow execution engine.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::sync::Semaphore;

use stepflow_core::record::StateRecord;

use super::compiler;
use super::config::EngineConfig;
use super::options::RunOptions;
use super::outcome::{BatchOutcome, RunId, RunOutcome, RunReport};
use crate::definition::{GraphDefinition, NodeName};
use crate::error::{RunError, RunFailure, ValidationError};
use crate::graph::{CompiledGraph, CompiledRouting, Successor};

/// Tracing target for engine operations.
const TRACING_TARGET: &str = "stepflow_runtime::engine";

/// The workflow execution engine.
///
/// Drives compiled graphs: one state record per run, strictly sequential
/// node execution within a run, semaphore-bounded concurrency across
/// runs. The engine itself never sleeps, polls, or retries — it only
/// suspends inside a node's own collaborator call.
pub struct Engine {
    config: EngineConfig,
    semaphore: Arc<Semaphore>,
}

impl Engine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_runs));

        tracing::info!(
            target: TRACING_TARGET,
            max_concurrent_runs = config.max_concurrent_runs,
            step_budget = config.step_budget,
            "Workflow engine initialized"
        );

        Self { config, semaphore }
    }

    /// Creates a new engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates and compiles a definition.
    ///
    /// Convenience passthrough to [`GraphDefinition::compile`].
    pub fn compile(&self, definition: GraphDefinition) -> Result<CompiledGraph, ValidationError> {
        compiler::compile(definition)
    }

    /// Executes one run with default options.
    ///
    /// See [`Engine::run_with`].
    pub async fn run(&self, graph: &CompiledGraph, state: StateRecord) -> RunOutcome {
        self.run_with(graph, state, RunOptions::default()).await
    }

    /// Executes one run of `graph` against `state`.
    ///
    /// The run starts at the entry point and follows edges until the
    /// terminal sentinel, a failure, cancellation, or step-budget
    /// exhaustion. On success the report carries the final state and the
    /// exact ordered path of node names visited; on failure the state as
    /// of the last completed node is returned alongside the error, never
    /// the output of a half-completed node.
    pub async fn run_with(
        &self,
        graph: &CompiledGraph,
        state: StateRecord,
        options: RunOptions,
    ) -> RunOutcome {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(err) => {
                return Err(RunFailure {
                    error: RunError::Internal(format!("semaphore closed: {err}")),
                    state,
                    path: Vec::new(),
                });
            }
        };

        let run_id = RunId::new();
        let budget = options.step_budget.unwrap_or(self.config.step_budget);
        let started = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            run_id = %run_id,
            entry_point = %graph.entry_point(),
            step_budget = budget,
            "Starting run"
        );

        match drive(graph, state, budget, &options).await {
            Ok((state, path, steps)) => {
                let elapsed = started.elapsed();
                tracing::debug!(
                    target: TRACING_TARGET,
                    run_id = %run_id,
                    steps,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Run completed"
                );
                Ok(RunReport {
                    run_id,
                    state,
                    path,
                    steps,
                    elapsed,
                })
            }
            Err(failure) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    run_id = %run_id,
                    error = %failure.error,
                    completed_nodes = failure.path.len(),
                    "Run failed"
                );
                Err(failure)
            }
        }
    }

    /// Executes every input as an independent run, with default options.
    ///
    /// See [`Engine::run_all_with`].
    pub async fn run_all(
        &self,
        graph: &CompiledGraph,
        inputs: Vec<StateRecord>,
    ) -> Vec<BatchOutcome> {
        self.run_all_with(graph, inputs, RunOptions::default()).await
    }

    /// Executes every input as an independent run.
    ///
    /// Returns one outcome per input, preserving input order. A failed
    /// run is recorded against its input and never aborts the rest of
    /// the batch. Runs proceed concurrently up to the engine's
    /// `max_concurrent_runs`.
    pub async fn run_all_with(
        &self,
        graph: &CompiledGraph,
        inputs: Vec<StateRecord>,
        options: RunOptions,
    ) -> Vec<BatchOutcome> {
        let total = inputs.len();

        tracing::debug!(
            target: TRACING_TARGET,
            total,
            "Starting batch run"
        );

        let outcomes: Vec<BatchOutcome> = futures::stream::iter(inputs.into_iter().map(|input| {
            let options = options.clone();
            async move {
                let outcome = self.run_with(graph, input.clone(), options).await;
                BatchOutcome { input, outcome }
            }
        }))
        .buffered(self.config.max_concurrent_runs)
        .collect()
        .await;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        tracing::debug!(
            target: TRACING_TARGET,
            total,
            failed,
            "Batch run completed"
        );

        outcomes
    }

    /// Returns the number of available run slots.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("available_slots", &self.available_slots())
            .finish()
    }
}

/// Drives one run to completion or failure.
///
/// Returns the final state, the path taken, and the step count.
async fn drive(
    graph: &CompiledGraph,
    initial: StateRecord,
    budget: usize,
    options: &RunOptions,
) -> Result<(StateRecord, Vec<NodeName>, usize), RunFailure> {
    let mut current = graph.entry_index();
    let mut state = initial;
    let mut path: Vec<NodeName> = Vec::new();
    let mut steps = 0usize;

    loop {
        // Cancellation and budget are both checked before the next node
        // is invoked, so neither can interrupt a node mid-flight: the
        // state returned is always that of the last completed node.
        if let Some(token) = &options.cancel {
            if token.is_cancelled() {
                return Err(fail(RunError::Cancelled, state, path));
            }
        }
        if steps >= budget {
            return Err(fail(RunError::StepBudgetExceeded { budget }, state, path));
        }

        let node = graph.node(current);

        let next_state = match node.transform.apply(state.clone()).await {
            Ok(next) => next,
            Err(source) => {
                return Err(fail(
                    RunError::NodeExecution {
                        node: node.name.clone(),
                        source,
                    },
                    state,
                    path,
                ));
            }
        };

        steps += 1;
        path.push(node.name.clone());

        tracing::trace!(
            target: TRACING_TARGET,
            node = %node.name,
            step = steps,
            "Node executed"
        );

        let successor = match &node.routing {
            CompiledRouting::Direct(successor) => *successor,
            CompiledRouting::Conditional { router, dispatch } => {
                let label = router.route(&next_state);
                match dispatch.get(&label) {
                    Some(successor) => {
                        tracing::trace!(
                            target: TRACING_TARGET,
                            node = %node.name,
                            label = %label,
                            "Routed"
                        );
                        *successor
                    }
                    None => {
                        return Err(fail(
                            RunError::UnroutableLabel {
                                node: node.name.clone(),
                                label,
                            },
                            next_state,
                            path,
                        ));
                    }
                }
            }
        };

        match successor {
            Successor::Terminal => return Ok((next_state, path, steps)),
            Successor::Node(next) => {
                current = next;
                state = next_state;
            }
        }
    }
}

fn fail(error: RunError, state: StateRecord, path: Vec<NodeName>) -> RunFailure {
    RunFailure { error, state, path }
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use stepflow_core::BoxedError;
    use stepflow_core::classify::KeywordClassifier;
    use stepflow_core::mock::{MockClassifier, MockSink};

    use super::*;
    use crate::definition::{TERMINAL, Target};
    use crate::error::RunErrorKind;
    use crate::node::{ClassifyNode, SinkNode, Transform, router_fn, transform_fn};

    /// Installs a subscriber so `RUST_LOG=stepflow_runtime=trace` shows
    /// engine output during test debugging. Safe to call repeatedly.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn tag(field: &'static str, value: &'static str) -> impl Transform {
        transform_fn(move |mut state| {
            state.insert(field, value);
            Ok(state)
        })
    }

    fn sentiment_router() -> impl crate::node::Router {
        router_fn(|state| state.get_str("sentiment").unwrap_or_default().to_string())
    }

    /// Entry `analyze` classifies `text` by the marker "good", then
    /// routes to `pos` or `neg`, both of which terminate.
    fn sentiment_graph() -> CompiledGraph {
        let mut def = GraphDefinition::new("analyze");
        def.add_node(
            "analyze",
            ClassifyNode::new(Arc::new(KeywordClassifier::new(["good"])), "text", "sentiment"),
        );
        def.add_node("pos", tag("mood", "upbeat"));
        def.add_node("neg", tag("mood", "downcast"));
        def.add_conditional_edges(
            "analyze",
            sentiment_router(),
            [("positive", "pos"), ("negative", "neg")],
        );
        def.add_edge("pos", TERMINAL);
        def.add_edge("neg", TERMINAL);
        def.compile().unwrap()
    }

    fn text_input(text: &str) -> StateRecord {
        StateRecord::new()
            .with_field("text", text)
            .with_field("sentiment", "")
    }

    fn path_names(path: &[NodeName]) -> Vec<&str> {
        path.iter().map(NodeName::as_str).collect()
    }

    #[tokio::test]
    async fn test_run_routes_positive_text() {
        init_tracing();
        let graph = sentiment_graph();
        let engine = Engine::with_defaults();

        let report = engine
            .run(&graph, text_input("this is good"))
            .await
            .unwrap();

        assert_eq!(report.state.get_str("text"), Some("this is good"));
        assert_eq!(report.state.get_str("sentiment"), Some("positive"));
        assert_eq!(path_names(&report.path), vec!["analyze", "pos"]);
        assert_eq!(report.steps, 2);
    }

    #[tokio::test]
    async fn test_run_routes_negative_text() {
        let graph = sentiment_graph();
        let engine = Engine::with_defaults();

        let report = engine
            .run(&graph, text_input("bad experience"))
            .await
            .unwrap();

        assert_eq!(report.state.get_str("sentiment"), Some("negative"));
        assert_eq!(path_names(&report.path), vec!["analyze", "neg"]);
    }

    #[tokio::test]
    async fn test_run_fails_on_unroutable_label() {
        let mut def = GraphDefinition::new("analyze");
        def.add_node(
            "analyze",
            ClassifyNode::new(Arc::new(MockClassifier::fixed("neutral")), "text", "sentiment"),
        );
        def.add_node("pos", tag("mood", "upbeat"));
        def.add_node("neg", tag("mood", "downcast"));
        def.add_conditional_edges(
            "analyze",
            sentiment_router(),
            [("positive", "pos"), ("negative", "neg")],
        );
        def.add_edge("pos", TERMINAL);
        def.add_edge("neg", TERMINAL);
        let graph = def.compile().unwrap();

        let failure = Engine::with_defaults()
            .run(&graph, text_input("meh"))
            .await
            .unwrap_err();

        match &failure.error {
            RunError::UnroutableLabel { node, label } => {
                assert_eq!(node.as_str(), "analyze");
                assert_eq!(label, "neutral");
            }
            other => panic!("expected UnroutableLabel, got {other:?}"),
        }
        // The analyze node itself completed, so its output is the state
        // at the failure point and it appears in the path.
        assert_eq!(failure.state.get_str("sentiment"), Some("neutral"));
        assert_eq!(path_names(&failure.path), vec!["analyze"]);
    }

    /// Conditional edge routes back to the same node until `remaining`
    /// hits zero.
    fn countdown_graph(start: i64) -> (CompiledGraph, StateRecord) {
        let mut def = GraphDefinition::new("tick");
        def.add_node(
            "tick",
            transform_fn(|mut state| {
                let remaining = state.get("remaining").and_then(|v| v.as_i64()).unwrap_or(0);
                state.insert("remaining", remaining - 1);
                Ok(state)
            }),
        );
        def.add_conditional_edges(
            "tick",
            router_fn(|state| {
                let remaining = state.get("remaining").and_then(|v| v.as_i64()).unwrap_or(0);
                if remaining > 0 { "again".into() } else { "done".into() }
            }),
            [("again", Target::from("tick")), ("done", TERMINAL)],
        );
        let graph = def.compile().unwrap();
        let input = StateRecord::new().with_field("remaining", start);
        (graph, input)
    }

    #[tokio::test]
    async fn test_step_budget_allows_exact_fit() {
        let (graph, input) = countdown_graph(5);
        let engine = Engine::with_defaults();

        let report = engine
            .run_with(&graph, input, RunOptions::new().with_step_budget(5))
            .await
            .unwrap();

        assert_eq!(report.steps, 5);
        assert_eq!(report.path.len(), 5);
    }

    #[tokio::test]
    async fn test_step_budget_fires_exactly_when_exceeded() {
        let (graph, input) = countdown_graph(5);
        let engine = Engine::with_defaults();

        let failure = engine
            .run_with(&graph, input, RunOptions::new().with_step_budget(4))
            .await
            .unwrap_err();

        assert!(matches!(
            failure.error,
            RunError::StepBudgetExceeded { budget: 4 }
        ));
        // Four nodes completed before the budget check stopped the run.
        assert_eq!(failure.path.len(), 4);
        assert_eq!(
            failure.state.get("remaining").and_then(|v| v.as_i64()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_node_failure_returns_state_of_last_completed_node() {
        let mut def = GraphDefinition::new("first");
        def.add_node("first", tag("checkpoint", "reached"));
        def.add_node(
            "second",
            transform_fn(|_state| -> Result<StateRecord, BoxedError> {
                Err("collaborator down".into())
            }),
        );
        def.add_edge("first", "second");
        def.add_edge("second", TERMINAL);
        let graph = def.compile().unwrap();

        let failure = Engine::with_defaults()
            .run(&graph, StateRecord::new())
            .await
            .unwrap_err();

        match &failure.error {
            RunError::NodeExecution { node, source } => {
                assert_eq!(node.as_str(), "second");
                assert_eq!(source.to_string(), "collaborator down");
            }
            other => panic!("expected NodeExecution, got {other:?}"),
        }
        assert_eq!(failure.state.get_str("checkpoint"), Some("reached"));
        assert_eq!(path_names(&failure.path), vec!["first"]);
    }

    #[tokio::test]
    async fn test_runs_are_deterministic() {
        let graph = sentiment_graph();
        let engine = Engine::with_defaults();
        let input = text_input("good enough");

        let first = engine.run(&graph, input.clone()).await.unwrap();
        let second = engine.run(&graph, input).await.unwrap();

        assert_eq!(first.state, second.state);
        assert_eq!(first.path, second.path);
    }

    #[tokio::test]
    async fn test_untouched_fields_carry_forward() {
        let graph = sentiment_graph();
        let input = text_input("good").with_field("request_id", "r-17");

        let report = Engine::with_defaults().run(&graph, input).await.unwrap();

        assert_eq!(report.state.get_str("request_id"), Some("r-17"));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_node() {
        let graph = sentiment_graph();
        let token = CancellationToken::new();
        token.cancel();

        let failure = Engine::with_defaults()
            .run_with(
                &graph,
                text_input("good"),
                RunOptions::new().with_cancel(token),
            )
            .await
            .unwrap_err();

        assert_eq!(failure.error.kind(), RunErrorKind::Cancelled);
        assert!(failure.path.is_empty());
        assert_eq!(failure.state.get_str("text"), Some("good"));
    }

    #[tokio::test]
    async fn test_cancelled_between_nodes() {
        let token = CancellationToken::new();
        let mut def = GraphDefinition::new("first");
        let trip = token.clone();
        def.add_node(
            "first",
            transform_fn(move |mut state| {
                trip.cancel();
                state.insert("first_done", true);
                Ok(state)
            }),
        );
        def.add_node("second", tag("second_done", "yes"));
        def.add_edge("first", "second");
        def.add_edge("second", TERMINAL);
        let graph = def.compile().unwrap();

        let failure = Engine::with_defaults()
            .run_with(
                &graph,
                StateRecord::new(),
                RunOptions::new().with_cancel(token),
            )
            .await
            .unwrap_err();

        assert_eq!(failure.error.kind(), RunErrorKind::Cancelled);
        assert_eq!(path_names(&failure.path), vec!["first"]);
        assert!(failure.state.contains("first_done"));
        assert!(!failure.state.contains("second_done"));
    }

    #[tokio::test]
    async fn test_batch_isolates_per_item_failure() {
        init_tracing();
        let mut def = GraphDefinition::new("check");
        def.add_node(
            "check",
            transform_fn(|state| -> Result<StateRecord, BoxedError> {
                if state.get_str("text") == Some("boom") {
                    Err("bad input".into())
                } else {
                    Ok(state)
                }
            }),
        );
        def.add_edge("check", TERMINAL);
        let graph = def.compile().unwrap();

        let inputs = vec![
            StateRecord::new().with_field("text", "one"),
            StateRecord::new().with_field("text", "boom"),
            StateRecord::new().with_field("text", "three"),
        ];
        let outcomes = Engine::with_defaults().run_all(&graph, inputs).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[2].is_success());
        // Outcomes stay in input order.
        assert_eq!(outcomes[1].input.get_str("text"), Some("boom"));
        assert_eq!(outcomes[2].input.get_str("text"), Some("three"));
    }

    #[tokio::test]
    async fn test_batch_drives_sink_per_input() {
        let sink = Arc::new(MockSink::new());
        let mut def = GraphDefinition::new("analyze");
        def.add_node(
            "analyze",
            ClassifyNode::new(Arc::new(KeywordClassifier::new(["good"])), "text", "sentiment"),
        );
        def.add_node("save", SinkNode::new(sink.clone()));
        def.add_edge("analyze", "save");
        def.add_edge("save", TERMINAL);
        let graph = def.compile().unwrap();

        let inputs = vec![text_input("good stuff"), text_input("terrible")];
        let outcomes = Engine::with_defaults().run_all(&graph, inputs).await;

        assert!(outcomes.iter().all(BatchOutcome::is_success));
        let stored = sink.stored();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].get_str("sentiment"), Some("positive"));
        assert_eq!(stored[1].get_str("sentiment"), Some("negative"));
    }

    #[tokio::test]
    async fn test_engine_slots_recover_after_runs() {
        let graph = sentiment_graph();
        let engine = Engine::new(
            EngineConfig {
                max_concurrent_runs: 2,
                step_budget: 16,
            },
        );

        let inputs = vec![text_input("good"), text_input("bad"), text_input("good")];
        let outcomes = engine.run_all(&graph, inputs).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(engine.available_slots(), 2);
    }
}
