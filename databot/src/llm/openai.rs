//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Uses `OPENAI_API_KEY` (and optionally `OPENAI_BASE_URL`) from the environment by
//! default, or an explicit `OpenAIConfig`. Plain text completions only.

use async_trait::async_trait;
use tracing::{debug, trace};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::llm::{LlmClient, LlmError, LlmResponse, LlmUsage};
use crate::message::Message;

/// OpenAI Chat Completions client.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
        }
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant(s) => {
                    ChatCompletionRequestMessage::Assistant((s.as_str()).into())
                }
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages));
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        debug!(
            trace_id = %trace_id,
            model = %self.model,
            message_count = messages.len(),
            "OpenAI chat create"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        if let Ok(js) = serde_json::to_string(&response) {
            trace!(trace_id = %trace_id, response = %js, "OpenAI response body");
        }

        let usage = response.usage.as_ref().map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Api("OpenAI returned no choices".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
        })
    }
}
