//! ReAct orchestrator: builds the think → act → observe graph once and runs
//! one independent turn per query.
//!
//! Interacts with [`StateGraph`](crate::graph::StateGraph), [`ThinkNode`],
//! [`ActNode`], [`ObserveNode`], the shared [`Session`] and the read-only
//! [`ToolRegistry`]. Each turn owns its own `ReActState`; dropping a turn's
//! future cancels it without touching the session or registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::Instrument;

use super::{ActNode, ObserveNode, RetryPolicy, ThinkNode, DEFAULT_SYSTEM_PROMPT};
use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, LoggingNodeMiddleware, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::session::Session;
use crate::state::{ConversationTurn, ReActState, TurnOutcome};
use crate::tools::ToolRegistry;

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Act/observe rounds per turn before the trace is summarized.
    pub max_iterations: u32,
    /// Node-step backstop; derived from `max_iterations` when `None`.
    pub recursion_limit: Option<usize>,
    pub retry: RetryPolicy,
    /// System instruction; `{tools}` is replaced by the tool list.
    pub system_prompt: String,
    /// Wrap nodes in `LoggingNodeMiddleware`.
    pub verbose: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            recursion_limit: None,
            retry: RetryPolicy::none(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            verbose: false,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Three nodes per round; enough for `max_iterations` full rounds.
    fn effective_recursion_limit(&self) -> usize {
        self.recursion_limit
            .unwrap_or(3 * self.max_iterations.max(1) as usize)
    }
}

/// Fresh state for one turn: system instruction then the user query.
pub fn build_initial_state(system_prompt: &str, query: &str) -> ReActState {
    ReActState::new(vec![Message::system(system_prompt), Message::user(query)])
}

fn render_system_prompt(template: &str, registry: &ToolRegistry) -> String {
    let tools = registry
        .iter()
        .map(|a| format!("- {}: {}", a.name(), a.description()))
        .collect::<Vec<_>>()
        .join("\n");
    template.replace("{tools}", &tools)
}

/// Runs ReAct turns against one session.
///
/// # Example
///
/// ```ignore
/// let orchestrator = Orchestrator::new(llm, session, registry, OrchestratorConfig::default())?;
/// let answer = orchestrator.process_query("Show me all products").await?;
/// ```
pub struct Orchestrator {
    compiled: CompiledStateGraph<ReActState>,
    session: Arc<Session>,
    registry: Arc<ToolRegistry>,
    system_prompt: String,
    turns: AtomicU64,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        session: Arc<Session>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Result<Self, CompilationError> {
        let think = ThinkNode::new(llm, registry.specs());
        let act = ActNode::new(Arc::clone(&registry), Arc::clone(&session)).with_retry(config.retry);
        let observe = ObserveNode::new(config.max_iterations);

        let mut graph = StateGraph::<ReActState>::new();
        graph
            .add_node("think", Arc::new(think))
            .add_node("act", Arc::new(act))
            .add_node("observe", Arc::new(observe))
            .add_edge(START, "think")
            .add_edge("think", "act")
            .add_edge("act", "observe")
            .add_edge("observe", END);

        let compiled = if config.verbose {
            graph.compile_with_middleware(Arc::new(LoggingNodeMiddleware))?
        } else {
            graph.compile()?
        };

        Ok(Self {
            compiled: compiled.with_recursion_limit(config.effective_recursion_limit()),
            system_prompt: render_system_prompt(&config.system_prompt, &registry),
            session,
            registry,
            turns: AtomicU64::new(0),
        })
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Rendered system instruction sent as the first message of every turn.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Runs one turn and returns it with its trace.
    ///
    /// # Errors
    ///
    /// `SourceUnavailable` when the session is not Ready at turn start;
    /// `ReasoningUnavailable` when the reasoning component cannot be reached.
    /// Tool failures are never errors here.
    pub async fn run_turn(&self, query: &str) -> Result<ConversationTurn, AgentError> {
        let turn_id = self.turns.fetch_add(1, Ordering::Relaxed) + 1;
        let span = tracing::info_span!("turn", turn = turn_id);
        async move {
            if !self.session.is_ready() {
                return Err(AgentError::SourceUnavailable(format!(
                    "session is {}",
                    self.session.state()
                )));
            }
            tracing::debug!(query = %query, "turn started");
            let state = self
                .compiled
                .invoke(build_initial_state(&self.system_prompt, query))
                .await?;

            let outcome = state.outcome.unwrap_or(TurnOutcome::Answered);
            let final_answer = state
                .final_answer
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| super::NO_RESPONSE.to_string());
            tracing::info!(
                tools_invoked = state.trace.len(),
                iterations = state.turn_count,
                outcome = ?outcome,
                "turn finished"
            );
            Ok(ConversationTurn {
                query: query.to_string(),
                trace: state.trace,
                final_answer,
                outcome,
                iterations: state.turn_count,
            })
        }
        .instrument(span)
        .await
    }

    /// Caller-facing entry point: query in, answer out.
    ///
    /// Failures inside the turn come back as an explanatory answer. Only a
    /// session that is not Ready is returned as `Err`; the caller has to
    /// re-establish it.
    pub async fn process_query(&self, query: &str) -> Result<String, AgentError> {
        match self.run_turn(query).await {
            Ok(turn) => Ok(turn.final_answer),
            Err(e @ AgentError::SourceUnavailable(_)) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "turn failed");
                Ok(format!("Error processing query: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, MockLlm};
    use crate::session::SessionConfig;
    use crate::tool_source::{MockToolSource, ToolSource};
    use serde_json::json;

    async fn orchestrator(llm: MockLlm, config: OrchestratorConfig) -> Orchestrator {
        let mock = Arc::new(MockToolSource::products_example());
        let session = Session::ready(mock.clone(), SessionConfig::default());
        let specs = mock.list_tools().await.unwrap();
        let registry = Arc::new(ToolRegistry::from_specs(specs, &session).unwrap());
        Orchestrator::new(Arc::new(llm), session, registry, config).unwrap()
    }

    /// **Scenario**: The system prompt lists every tool with its description.
    #[tokio::test]
    async fn system_prompt_lists_tools() {
        let o = orchestrator(MockLlm::with_no_tool_calls("hi"), OrchestratorConfig::default()).await;
        assert!(o.system_prompt().contains("- list_products: List all products in the database."));
        assert!(o.system_prompt().contains("- get_product_by_id:"));
        assert!(!o.system_prompt().contains("{tools}"));
    }

    #[tokio::test]
    async fn direct_answer_needs_no_tools() {
        let o = orchestrator(MockLlm::with_no_tool_calls("Hello!"), OrchestratorConfig::default()).await;
        let turn = o.run_turn("hi").await.unwrap();
        assert_eq!(turn.final_answer, "Hello!");
        assert!(turn.trace.is_empty());
        assert_eq!(turn.iterations, 0);
    }

    /// **Scenario**: ReasoningUnavailable becomes an explanatory answer from process_query.
    #[tokio::test]
    async fn process_query_explains_reasoning_failure() {
        let o = orchestrator(MockLlm::unavailable("503"), OrchestratorConfig::default()).await;
        assert!(matches!(
            o.run_turn("q").await,
            Err(AgentError::ReasoningUnavailable(_))
        ));
        let answer = o.process_query("q").await.unwrap();
        assert!(answer.starts_with("Error processing query:"), "{}", answer);
    }

    /// **Scenario**: A model that always calls a tool is cut off at max_iterations.
    #[tokio::test]
    async fn iteration_limit_is_bounded() {
        let llm = MockLlm::new(vec![LlmResponse::tool_call("list_products", json!({}))]);
        let o = orchestrator(llm, OrchestratorConfig::default().with_max_iterations(3)).await;
        let turn = o.run_turn("loop forever").await.unwrap();
        assert_eq!(turn.outcome, TurnOutcome::IterationLimit);
        assert_eq!(turn.iterations, 3);
        assert_eq!(turn.trace.len(), 3);
        assert!(!turn.final_answer.is_empty());
    }
}
