//! Intents, their parameters and classifier predictions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A typed slot of an intent, filled by entity extraction.
///
/// `fragment` is the placeholder used inside training sentences (e.g. `TOPIC` in
/// `"Can you give me a TOPIC dataset"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentParameter {
    pub name: String,
    pub fragment: String,
    pub entity_name: String,
    pub entity_description: String,
}

/// A classified category of user utterance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub training_sentences: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<IntentParameter>,
}

impl Intent {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            training_sentences: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn with_sentences<I, S>(mut self, sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.training_sentences
            .extend(sentences.into_iter().map(Into::into));
        self
    }

    /// Declares a parameter `name` written as `fragment` in training sentences.
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        fragment: impl Into<String>,
        entity_name: impl Into<String>,
        entity_description: impl Into<String>,
    ) -> Self {
        self.parameters.push(IntentParameter {
            name: name.into(),
            fragment: fragment.into(),
            entity_name: entity_name.into(),
            entity_description: entity_description.into(),
        });
        self
    }
}

/// Classifier output for one message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentPrediction {
    pub intent: String,
    /// Confidence in `[0, 1]`.
    pub score: f32,
    /// Declared parameter name to extracted value (`None` when extraction found nothing).
    #[serde(default)]
    pub parameters: HashMap<String, Option<String>>,
}

impl IntentPrediction {
    pub fn new(intent: impl Into<String>, score: f32) -> Self {
        Self {
            intent: intent.into(),
            score,
            parameters: HashMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Extracted value of `name`; `None` when missing or blank.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .and_then(|v| v.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}
