//! Shared state and nodes for the StateGraph tests.

use async_trait::async_trait;
use mcpbridge::{AgentError, Message, Next, Node};

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub rounds: u32,
}

/// Echoes the last user message as an assistant message.
pub struct EchoNode;

#[async_trait]
impl Node<ChatState> for EchoNode {
    fn id(&self) -> &str {
        "echo"
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let mut state = state;
        let reply = state
            .messages
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::User(s) => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_default();
        state.messages.push(Message::Assistant(reply));
        Ok((state, Next::Continue))
    }
}

/// Jumps back to `target` until `rounds` reaches `until`, then ends.
pub struct LoopBackNode {
    pub target: &'static str,
    pub until: u32,
}

#[async_trait]
impl Node<ChatState> for LoopBackNode {
    fn id(&self) -> &str {
        "loop_back"
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let mut state = state;
        state.rounds += 1;
        if state.rounds >= self.until {
            Ok((state, Next::End))
        } else {
            Ok((state, Next::Node(self.target.to_string())))
        }
    }
}
