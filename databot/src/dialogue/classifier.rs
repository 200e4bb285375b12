//! Intent classification capability.
//!
//! - [`SimpleIntentClassifier`]: deterministic matching against training sentences, with
//!   parameter placeholders captured as free text. Used offline and in tests.
//! - [`LlmIntentClassifier`]: asks the LLM with intent and entity descriptions and parses a
//!   JSON answer.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::intent::{Intent, IntentPrediction};
use crate::llm::LlmClient;
use crate::prompts;

/// Classifies one user message against the dialogue's intents.
///
/// Returns `None` when no intent applies; the runtime then runs the fallback body.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, message: &str, intents: &[Intent]) -> Option<IntentPrediction>;
}

/// Training-sentence matcher. A sentence matches when the whole message equals it
/// (case-insensitive, flexible whitespace, trailing punctuation ignored), with each parameter
/// fragment matching any non-empty text.
#[derive(Clone, Debug, Default)]
pub struct SimpleIntentClassifier;

impl SimpleIntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Regex for one training sentence; group `pN` captures parameter N.
    fn sentence_regex(sentence: &str, intent: &Intent) -> Option<Regex> {
        let mut pattern = String::from(r"(?i)^\s*");
        let words: Vec<&str> = sentence.split_whitespace().collect();
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                pattern.push_str(r"\s+");
            }
            match intent.parameters.iter().position(|p| p.fragment == *word) {
                Some(idx) => pattern.push_str(&format!("(?P<p{}>.+?)", idx)),
                None => pattern.push_str(&regex::escape(word)),
            }
        }
        pattern.push_str(r"[\s[:punct:]]*$");
        match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(intent = %intent.name, sentence = %sentence, error = %e, "bad training sentence");
                None
            }
        }
    }
}

fn strip_quotes(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

#[async_trait]
impl IntentClassifier for SimpleIntentClassifier {
    async fn classify(&self, message: &str, intents: &[Intent]) -> Option<IntentPrediction> {
        for intent in intents {
            for sentence in &intent.training_sentences {
                let Some(re) = Self::sentence_regex(sentence, intent) else {
                    continue;
                };
                let Some(caps) = re.captures(message) else {
                    continue;
                };
                let mut prediction = IntentPrediction::new(intent.name.clone(), 1.0);
                for (idx, param) in intent.parameters.iter().enumerate() {
                    let value = caps
                        .name(&format!("p{}", idx))
                        .map(|m| strip_quotes(m.as_str()))
                        .filter(|v| !v.is_empty());
                    prediction = prediction.with_parameter(param.name.clone(), value);
                }
                debug!(intent = %intent.name, "training sentence matched");
                return Some(prediction);
            }
        }
        None
    }
}

#[derive(Debug, Deserialize)]
struct LlmClassification {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    parameters: HashMap<String, serde_json::Value>,
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid json object regex"))
}

/// LLM-backed classifier using intent descriptions and entity descriptions (no training
/// sentences in the prompt).
pub struct LlmIntentClassifier {
    llm: Arc<dyn LlmClient>,
}

impl LlmIntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Parses the LLM answer; unknown intents and undeclared parameters are dropped.
    pub fn parse_answer(answer: &str, intents: &[Intent]) -> Option<IntentPrediction> {
        let raw = json_object_regex().find(answer)?.as_str();
        let parsed: LlmClassification = match serde_json::from_str(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "classification answer is not json");
                return None;
            }
        };
        let name = parsed.intent.filter(|n| !n.is_empty() && n != "null")?;
        let intent = intents.iter().find(|i| i.name == name)?;
        let mut prediction =
            IntentPrediction::new(intent.name.clone(), parsed.score.unwrap_or(1.0).clamp(0.0, 1.0));
        for param in &intent.parameters {
            let value = match parsed.parameters.get(&param.name) {
                Some(serde_json::Value::String(s)) => Some(strip_quotes(s)).filter(|v| !v.is_empty()),
                Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            prediction = prediction.with_parameter(param.name.clone(), value);
        }
        Some(prediction)
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, message: &str, intents: &[Intent]) -> Option<IntentPrediction> {
        let prompt = prompts::classification_prompt(intents, message);
        match self.llm.predict(&prompt).await {
            Ok(answer) => Self::parse_answer(&answer, intents),
            Err(e) => {
                warn!(error = %e, "intent classification failed");
                None
            }
        }
    }
}
