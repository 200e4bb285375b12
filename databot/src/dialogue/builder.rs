//! Dialogue definition: intents, states and transition rules.
//!
//! Add intents with `add_intent`, states with `add_state`, then wire them with `on_intent`,
//! `when_var_equals`, `go_to`, `on_any_input` and `global_on_intent`. `compile` validates every
//! reference and returns an immutable [`Dialogue`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::classifier::{IntentClassifier, SimpleIntentClassifier};
use super::compile_error::CompileError;
use super::intent::Intent;
use super::runtime::Dialogue;
use super::state::{Body, Predicate, ReplyBody, State, TransitionRule};
use crate::session::SessionValue;

/// Reply used when no fallback body was set.
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I didn't get it. Could you rephrase?";

/// Predictions scoring below this are treated as "no intent" unless overridden.
pub const DEFAULT_INTENT_THRESHOLD: f32 = 0.5;

/// Dialogue under construction.
///
/// **Interaction**: Produces `Dialogue` via `compile()`; the bot module is the main user.
pub struct DialogueBuilder {
    intents: Vec<Intent>,
    states: Vec<State>,
    /// (source state, rule) in declaration order.
    rules: Vec<(String, TransitionRule)>,
    global_rules: Vec<TransitionRule>,
    fallback: Option<Arc<dyn Body>>,
    classifier: Arc<dyn IntentClassifier>,
    intent_threshold: f32,
}

impl Default for DialogueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogueBuilder {
    pub fn new() -> Self {
        Self {
            intents: Vec::new(),
            states: Vec::new(),
            rules: Vec::new(),
            global_rules: Vec::new(),
            fallback: None,
            classifier: Arc::new(SimpleIntentClassifier::new()),
            intent_threshold: DEFAULT_INTENT_THRESHOLD,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_intent_threshold(mut self, threshold: f32) -> Self {
        self.intent_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn add_intent(&mut self, intent: Intent) -> &mut Self {
        self.intents.push(intent);
        self
    }

    pub fn add_state(&mut self, state: State) -> &mut Self {
        self.states.push(state);
        self
    }

    /// `source` moves to `target` when the message is classified as `intent`.
    pub fn on_intent(
        &mut self,
        source: impl Into<String>,
        intent: impl Into<String>,
        target: impl Into<String>,
    ) -> &mut Self {
        self.rule(source, Predicate::IntentMatched(intent.into()), target)
    }

    /// `source` moves to `target` when `session[var] == value`.
    pub fn when_var_equals(
        &mut self,
        source: impl Into<String>,
        var: impl Into<String>,
        value: impl Into<SessionValue>,
        target: impl Into<String>,
    ) -> &mut Self {
        self.rule(
            source,
            Predicate::VariableEquals(var.into(), value.into()),
            target,
        )
    }

    /// Unconditional move from `source` to `target`.
    pub fn go_to(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.rule(source, Predicate::Always, target)
    }

    /// `source` moves to `target` on the next user message, whatever its intent.
    pub fn on_any_input(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> &mut Self {
        self.rule(source, Predicate::AnyInput, target)
    }

    /// From any state, `intent` moves to the global state `target`.
    pub fn global_on_intent(
        &mut self,
        intent: impl Into<String>,
        target: impl Into<String>,
    ) -> &mut Self {
        self.global_rules.push(TransitionRule::new(
            Predicate::IntentMatched(intent.into()),
            target,
        ));
        self
    }

    /// Body run when a message matches no rule.
    pub fn set_fallback(&mut self, body: Arc<dyn Body>) -> &mut Self {
        self.fallback = Some(body);
        self
    }

    fn rule(
        &mut self,
        source: impl Into<String>,
        predicate: Predicate,
        target: impl Into<String>,
    ) -> &mut Self {
        self.rules
            .push((source.into(), TransitionRule::new(predicate, target)));
        self
    }

    /// Validates the definition and freezes it.
    pub fn compile(self) -> Result<Dialogue, CompileError> {
        let mut intent_names = HashSet::new();
        for intent in &self.intents {
            if !intent_names.insert(intent.name.as_str()) {
                return Err(CompileError::DuplicateIntent(intent.name.clone()));
            }
        }

        let mut states: HashMap<String, State> = HashMap::new();
        for state in self.states {
            if states.contains_key(&state.name) {
                return Err(CompileError::DuplicateState(state.name));
            }
            states.insert(state.name.clone(), state);
        }

        let mut initial: Vec<String> = states
            .values()
            .filter(|s| s.initial)
            .map(|s| s.name.clone())
            .collect();
        initial.sort();
        let initial = match initial.len() {
            0 => return Err(CompileError::MissingInitial),
            1 => initial.remove(0),
            _ => return Err(CompileError::MultipleInitial(initial)),
        };

        let check_rule = |rule: &TransitionRule| -> Result<(), CompileError> {
            if !states.contains_key(&rule.target) {
                return Err(CompileError::StateNotFound(rule.target.clone()));
            }
            if let Predicate::IntentMatched(intent) = &rule.predicate {
                if !intent_names.contains(intent.as_str()) {
                    return Err(CompileError::IntentNotFound(intent.clone()));
                }
            }
            Ok(())
        };
        for (source, rule) in &self.rules {
            if !states.contains_key(source) {
                return Err(CompileError::StateNotFound(source.clone()));
            }
            check_rule(rule)?;
        }
        for rule in &self.global_rules {
            check_rule(rule)?;
            if !states[&rule.target].global {
                return Err(CompileError::GlobalTargetNotGlobal(rule.target.clone()));
            }
        }

        for (source, rule) in self.rules {
            if let Some(state) = states.get_mut(&source) {
                state.rules.push(rule);
            }
        }

        let fallback = self
            .fallback
            .unwrap_or_else(|| Arc::new(ReplyBody(DEFAULT_FALLBACK_REPLY.to_string())));

        Ok(Dialogue::new(
            self.intents,
            states,
            initial,
            self.global_rules,
            State::fallback_state(fallback),
            self.classifier,
            self.intent_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DialogueBuilder {
        let mut b = DialogueBuilder::new();
        b.add_intent(Intent::new("hello_intent", "greeting"))
            .add_state(State::new("a").initial())
            .add_state(State::new("b"));
        b
    }

    /// **Scenario**: A minimal valid graph compiles.
    #[test]
    fn compile_valid_graph() {
        let mut b = base();
        b.on_intent("a", "hello_intent", "b").go_to("b", "a");
        let d = b.compile().unwrap();
        assert_eq!(d.initial_state(), "a");
        assert_eq!(d.state("a").unwrap().rules().len(), 1);
    }

    /// **Scenario**: No initial state is rejected.
    #[test]
    fn compile_missing_initial() {
        let mut b = DialogueBuilder::new();
        b.add_state(State::new("a"));
        assert_eq!(b.compile().unwrap_err(), CompileError::MissingInitial);
    }

    /// **Scenario**: Two initial states are rejected and both are named.
    #[test]
    fn compile_multiple_initial() {
        let mut b = base();
        b.add_state(State::new("c").initial());
        assert_eq!(
            b.compile().unwrap_err(),
            CompileError::MultipleInitial(vec!["a".into(), "c".into()])
        );
    }

    /// **Scenario**: Duplicate state and intent names are rejected.
    #[test]
    fn compile_duplicates() {
        let mut b = base();
        b.add_state(State::new("b"));
        assert_eq!(
            b.compile().unwrap_err(),
            CompileError::DuplicateState("b".into())
        );

        let mut b = base();
        b.add_intent(Intent::new("hello_intent", "again"));
        assert_eq!(
            b.compile().unwrap_err(),
            CompileError::DuplicateIntent("hello_intent".into())
        );
    }

    /// **Scenario**: Rules referencing unknown states or intents are rejected.
    #[test]
    fn compile_unknown_references() {
        let mut b = base();
        b.go_to("a", "nowhere");
        assert_eq!(
            b.compile().unwrap_err(),
            CompileError::StateNotFound("nowhere".into())
        );

        let mut b = base();
        b.go_to("ghost", "a");
        assert_eq!(
            b.compile().unwrap_err(),
            CompileError::StateNotFound("ghost".into())
        );

        let mut b = base();
        b.on_intent("a", "bye_intent", "b");
        assert_eq!(
            b.compile().unwrap_err(),
            CompileError::IntentNotFound("bye_intent".into())
        );
    }

    /// **Scenario**: A global rule must target a state flagged global.
    #[test]
    fn compile_global_target_must_be_global() {
        let mut b = base();
        b.global_on_intent("hello_intent", "b");
        assert_eq!(
            b.compile().unwrap_err(),
            CompileError::GlobalTargetNotGlobal("b".into())
        );

        let mut b = base();
        b.add_state(State::new("g").global())
            .global_on_intent("hello_intent", "g");
        assert!(b.compile().is_ok());
    }
}
