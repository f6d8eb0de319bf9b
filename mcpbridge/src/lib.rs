//! # mcpbridge
//!
//! Bridges tools published by a remote MCP server into a bounded ReAct agent
//! loop. A reasoning component (LLM) proposes tool calls; the bridge validates
//! and forwards them over a single session and feeds the results back until the
//! model answers or the iteration limit is reached.
//!
//! ## Main Modules
//!
//! - [`tool_source`]: `ToolSource` trait, MCP transports (Streamable HTTP, stdio), `MockToolSource`.
//! - [`session`]: `Session` lifecycle, `SessionManager` (connect, discover, disconnect).
//! - [`tools`]: `ToolDescriptor`, typed input schemas, `ToolAdapter`, `ToolRegistry`.
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Node`, `Next`.
//! - [`react`]: think / act / observe nodes and the `Orchestrator`.
//! - [`llm`]: `LlmClient` trait, `MockLlm`, and `ChatOpenAI` behind feature `openai`.
//! - [`agent`]: startup and shutdown of one run.
//!
//! ## Features
//!
//! - `mcp` (default): MCP tool source over HTTP and stdio.
//! - `openai` (default): OpenAI / Azure OpenAI chat completions via `async-openai`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcpbridge::{Agent, AgentConfig, MockLlm, MockToolSource};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let source = Arc::new(MockToolSource::products_example());
//! let llm = Arc::new(MockLlm::with_no_tool_calls("There are two products."));
//! let agent = Agent::startup(&source, llm, AgentConfig::default()).await.unwrap();
//! let answer = agent.process_query("Show me all products").await.unwrap();
//! println!("{}", answer);
//! agent.shutdown().await;
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod llm;
pub mod message;
pub mod react;
pub mod session;
pub mod state;
pub mod tool_source;
pub mod tools;

pub use agent::{Agent, AgentConfig, StartupError};
pub use error::AgentError;
pub use graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END, START};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use llm::{LlmClient, LlmResponse, MockLlm, Proposal, ToolChoiceMode};
pub use message::Message;
pub use react::{Orchestrator, OrchestratorConfig, RetryPolicy, DEFAULT_SYSTEM_PROMPT};
pub use session::{Connector, Session, SessionConfig, SessionError, SessionManager, SessionState};
pub use state::{ConversationTurn, ReActState, ToolCall, TraceEntry, TurnOutcome};
#[cfg(feature = "mcp")]
pub use tool_source::{McpTarget, McpToolSource};
pub use tool_source::{
    MockToolBehavior, MockToolSource, ToolCallContent, ToolSource, ToolSourceError, ToolSpec,
};
pub use tools::{InvocationRequest, InvocationResult, ToolAdapter, ToolDescriptor, ToolRegistry};
