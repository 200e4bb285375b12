//! LLM client abstraction used by the bot bodies, the aggregator and the intent classifier.
//!
//! Every prompt in this crate is single-turn text-in/text-out; the [`LlmClient::predict`]
//! convenience wraps a prompt into one user message. Implementations: [`MockLlm`]
//! (scripted responses, records prompts) and [`ChatOpenAI`] (OpenAI-compatible API).

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

/// Error from one LLM call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Request could not be built (bad model name, empty messages).
    #[error("llm request build failed: {0}")]
    Request(String),
    /// The provider returned an error or an unusable response.
    #[error("llm api error: {0}")]
    Api(String),
}

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion.
#[derive(Clone, Debug)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Token usage for this call, when the provider reports it.
    pub usage: Option<LlmUsage>,
}

/// LLM client: given messages, returns assistant text.
///
/// **Interaction**: Used by bot bodies (greeting, small talk, fallback), by
/// `DatasetFinder` for title/description synthesis, by `refine::narrow` for ranking
/// and by `LlmIntentClassifier`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn: read messages, return assistant content.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError>;

    /// Single-prompt completion. Default implementation sends one user message.
    async fn predict(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.invoke(&[Message::user(prompt)]).await?;
        Ok(response.content)
    }
}
