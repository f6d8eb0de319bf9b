//! Lifecycle of one agent run: connect and discover at startup, answer
//! queries, tear the session down at shutdown.
//!
//! Wires [`SessionManager`] (connection, discovery, registry) to an
//! [`Orchestrator`]. The CLI calls [`Agent::startup`] once before reading any
//! query and [`Agent::shutdown`] once on every exit path.

use std::sync::Arc;

use thiserror::Error;

use crate::error::AgentError;
use crate::graph::CompilationError;
use crate::llm::LlmClient;
use crate::react::{Orchestrator, OrchestratorConfig};
use crate::session::{Connector, Session, SessionConfig, SessionError, SessionManager};
use crate::state::ConversationTurn;
use crate::tools::ToolRegistry;

/// Session and orchestrator settings for one run.
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    pub session: SessionConfig,
    pub orchestrator: OrchestratorConfig,
}

/// Why startup did not produce a usable agent.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to build agent graph: {0}")]
    Graph(#[from] CompilationError),
}

/// A connected agent.
pub struct Agent {
    manager: SessionManager,
    orchestrator: Orchestrator,
}

impl Agent {
    /// Connects to the tool source, discovers its tools and builds the orchestrator.
    ///
    /// The session is closed again if anything after the connection fails.
    pub async fn startup(
        connector: &dyn Connector,
        llm: Arc<dyn LlmClient>,
        config: AgentConfig,
    ) -> Result<Self, StartupError> {
        let mut manager = SessionManager::new(config.session);
        let (session, registry) = manager.connect(connector).await?;
        match Orchestrator::new(llm, session, registry, config.orchestrator) {
            Ok(orchestrator) => Ok(Self { manager, orchestrator }),
            Err(e) => {
                manager.disconnect().await;
                Err(e.into())
            }
        }
    }

    /// Names of the discovered tools, in discovery order.
    pub fn tool_names(&self) -> Vec<String> {
        self.orchestrator
            .registry()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.orchestrator.registry()
    }

    pub fn session(&self) -> &Arc<Session> {
        self.orchestrator.session()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// See [`Orchestrator::process_query`].
    pub async fn process_query(&self, query: &str) -> Result<String, AgentError> {
        self.orchestrator.process_query(query).await
    }

    /// See [`Orchestrator::run_turn`].
    pub async fn run_turn(&self, query: &str) -> Result<ConversationTurn, AgentError> {
        self.orchestrator.run_turn(query).await
    }

    /// Drains in-flight calls and closes the session.
    pub async fn shutdown(self) {
        self.manager.disconnect().await;
    }
}
