//! Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Works against OpenAI (`OpenAIConfig`) or an Azure OpenAI deployment
//! (`AzureConfig`). Tool specs are sent on every request as function tools, so
//! the response may carry `tool_calls`.
//!
//! **Interaction**: Implements `LlmClient`; used by ThinkNode like `MockLlm`.
//! Depends on `async_openai` (feature `openai`).

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::state::ToolCall;
use crate::tool_source::ToolSpec;

use async_openai::{
    config::{AzureConfig, Config, OpenAIConfig},
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
        ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequestArgs,
        FunctionObject, ToolChoiceOptions,
    },
    Client,
};

use super::ToolChoiceMode;

/// Chat Completions client.
///
/// `ChatOpenAI::new` reads `OPENAI_API_KEY` from the environment;
/// `ChatOpenAI::azure` targets a deployment. The model name is ignored by Azure
/// (the deployment decides) but is still logged.
pub struct ChatOpenAI<C: Config = OpenAIConfig> {
    client: Client<C>,
    model: String,
    temperature: Option<f32>,
    tool_choice: Option<ToolChoiceMode>,
}

impl ChatOpenAI<OpenAIConfig> {
    /// Default config (API key from `OPENAI_API_KEY`).
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new(), model)
    }
}

impl ChatOpenAI<AzureConfig> {
    /// Azure OpenAI deployment.
    pub fn azure(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let deployment = deployment.into();
        let config = AzureConfig::new()
            .with_api_base(endpoint)
            .with_api_key(api_key)
            .with_deployment_id(deployment.clone())
            .with_api_version(api_version);
        Self::with_config(config, deployment)
    }
}

impl<C: Config> ChatOpenAI<C> {
    /// Custom config (API key, base URL, Azure deployment).
    pub fn with_config(config: C, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
            tool_choice: None,
        }
    }

    /// Temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Overrides the API default tool choice when tools are present.
    pub fn with_tool_choice(mut self, mode: ToolChoiceMode) -> Self {
        self.tool_choice = Some(mode);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages.iter().map(request_message).collect()
    }

    fn tools_to_request(tools: &[ToolSpec]) -> Vec<ChatCompletionTools> {
        tools
            .iter()
            .map(|spec| {
                ChatCompletionTools::Function(ChatCompletionTool {
                    function: FunctionObject {
                        name: spec.name.clone(),
                        description: spec.description.clone(),
                        parameters: Some(spec.input_schema.clone()),
                        ..Default::default()
                    },
                })
            })
            .collect()
    }
}

fn request_message(message: &Message) -> ChatCompletionRequestMessage {
    match message {
        Message::System(text) => ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage::from(text.as_str()),
        ),
        Message::User(text) => {
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(text.as_str()))
        }
        Message::Assistant(text) => ChatCompletionRequestMessage::Assistant(text.as_str().into()),
    }
}

fn choice_option(mode: ToolChoiceMode) -> ChatCompletionToolChoiceOption {
    ChatCompletionToolChoiceOption::Mode(match mode {
        ToolChoiceMode::Auto => ToolChoiceOptions::Auto,
        ToolChoiceMode::None => ToolChoiceOptions::None,
        ToolChoiceMode::Required => ToolChoiceOptions::Required,
    })
}

/// Function calls become proposals; other tool call kinds are dropped.
fn proposed_calls(calls: Option<Vec<ChatCompletionMessageToolCalls>>) -> Vec<ToolCall> {
    calls
        .unwrap_or_default()
        .into_iter()
        .filter_map(|call| match call {
            ChatCompletionMessageToolCalls::Function(f) => Some(ToolCall {
                name: f.function.name,
                arguments: f.function.arguments,
                id: Some(f.id),
            }),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl<C: Config + Send + Sync + 'static> LlmClient for ChatOpenAI<C> {
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LlmResponse, AgentError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone())
            .messages(Self::messages_to_request(messages));
        if !tools.is_empty() {
            args.tools(Self::tools_to_request(tools));
            if let Some(mode) = self.tool_choice {
                args.tool_choice(choice_option(mode));
            }
        }
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        let request = args
            .build()
            .map_err(|e| AgentError::ReasoningUnavailable(format!("invalid chat request: {}", e)))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::warn!(model = %self.model, error = %e, "chat completion failed");
            AgentError::ReasoningUnavailable(format!("chat API error: {}", e))
        })?;
        let Some(choice) = response.choices.into_iter().next() else {
            return Err(AgentError::ReasoningUnavailable("chat API returned no choices".into()));
        };
        tracing::debug!(model = %self.model, finish_reason = ?choice.finish_reason, "chat completion");

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls: proposed_calls(choice.message.tool_calls),
        })
    }
}
