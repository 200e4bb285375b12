//! Mock LLM for tests and offline runs.
//!
//! Returns scripted responses in order, then a fixed default. Every call's messages are
//! recorded so tests can assert on what was asked (e.g. that the ranking prompt lists every URL).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, LlmResponse};
use crate::message::Message;

/// Mock LLM: scripted responses, then a fixed default.
///
/// A scripted `Err` lets tests exercise the fallback paths (enrichment, greeting, ranking).
pub struct MockLlm {
    scripted: Mutex<VecDeque<Result<String, String>>>,
    default: String,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Always answers `content`.
    pub fn fixed(content: impl Into<String>) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            default: content.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers each of `responses` once, in order, then `default`.
    pub fn scripted<I, T>(responses: I, default: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            scripted: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            default: default.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues one failing call before the remaining script.
    pub fn push_error(&self, message: impl Into<String>) {
        if let Ok(mut q) = self.scripted.lock() {
            q.push_back(Err(message.into()));
        }
    }

    /// Queues one more scripted response.
    pub fn push_response(&self, content: impl Into<String>) {
        if let Ok(mut q) = self.scripted.lock() {
            q.push_back(Ok(content.into()));
        }
    }

    /// Prompts received so far (last message content of each call).
    pub fn prompts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|m| m.last().map(|m| m.content().to_string()).unwrap_or_default())
            .collect()
    }

    /// Full message list of every call so far.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, LlmError> {
        if let Ok(mut c) = self.calls.lock() {
            c.push(messages.to_vec());
        }
        let next = self.scripted.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(content)) => Ok(LlmResponse {
                content,
                usage: None,
            }),
            Some(Err(e)) => Err(LlmError::Api(e)),
            None => Ok(LlmResponse {
                content: self.default.clone(),
                usage: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_then_default() {
        let llm = MockLlm::scripted(["one", "two"], "rest");
        assert_eq!(llm.predict("a").await.unwrap(), "one");
        assert_eq!(llm.predict("b").await.unwrap(), "two");
        assert_eq!(llm.predict("c").await.unwrap(), "rest");
        assert_eq!(llm.prompts(), vec!["a", "b", "c"]);
        assert!(llm.calls().iter().all(|c| c.len() == 1));
    }

    #[tokio::test]
    async fn pushed_error_is_returned_once() {
        let llm = MockLlm::fixed("ok");
        llm.push_error("boom");
        assert!(llm.predict("x").await.is_err());
        assert_eq!(llm.predict("y").await.unwrap(), "ok");
        assert_eq!(llm.call_count(), 2);
    }
}
