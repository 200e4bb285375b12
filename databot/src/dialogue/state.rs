//! Dialogue states, bodies and transition rules.
//!
//! States and rules are plain values assembled by `DialogueBuilder` and frozen by `compile`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::session::{Session, SessionValue};

/// Procedure run when a state becomes active.
///
/// A body never fails: problems are reported to the user through `Session::reply` and the
/// state's rules decide where the session goes next.
#[async_trait]
pub trait Body: Send + Sync {
    async fn run(&self, session: &mut Session);
}

/// Body from a synchronous closure (fixed replies, variable updates).
pub struct FnBody<F>(pub F);

#[async_trait]
impl<F> Body for FnBody<F>
where
    F: Fn(&mut Session) + Send + Sync,
{
    async fn run(&self, session: &mut Session) {
        (self.0)(session)
    }
}

/// Body that replies one fixed text.
pub struct ReplyBody(pub String);

#[async_trait]
impl Body for ReplyBody {
    async fn run(&self, session: &mut Session) {
        session.reply(self.0.clone());
    }
}

/// When a rule fires.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// The incoming message was classified as this intent.
    IntentMatched(String),
    /// `session[var] == value`; a missing variable never matches.
    VariableEquals(String, SessionValue),
    /// Always true ("go_to").
    Always,
    /// Any incoming message, whatever its intent (free-text answers).
    AnyInput,
}

/// What triggered rule evaluation.
#[derive(Clone, Copy, Debug)]
pub enum Trigger<'a> {
    /// A state body just finished; no message is pending.
    BodyDone,
    /// A user message arrived; `intent` is the accepted prediction, if any.
    Message { intent: Option<&'a str> },
}

impl Predicate {
    pub fn matches(&self, session: &Session, trigger: Trigger<'_>) -> bool {
        match (self, trigger) {
            (Predicate::Always, _) => true,
            (Predicate::VariableEquals(var, value), _) => session.get(var) == Some(value),
            (Predicate::IntentMatched(name), Trigger::Message { intent }) => {
                intent == Some(name.as_str())
            }
            (Predicate::AnyInput, Trigger::Message { .. }) => true,
            (Predicate::IntentMatched(_) | Predicate::AnyInput, Trigger::BodyDone) => false,
        }
    }
}

/// Predicate plus target state; declaration order is priority.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRule {
    pub predicate: Predicate,
    pub target: String,
}

impl TransitionRule {
    pub fn new(predicate: Predicate, target: impl Into<String>) -> Self {
        Self {
            predicate,
            target: target.into(),
        }
    }
}

/// One dialogue state.
#[derive(Clone)]
pub struct State {
    pub(crate) name: String,
    pub(crate) body: Option<Arc<dyn Body>>,
    pub(crate) rules: Vec<TransitionRule>,
    pub(crate) initial: bool,
    pub(crate) global: bool,
    pub(crate) fallback: bool,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: None,
            rules: Vec::new(),
            initial: false,
            global: false,
            fallback: false,
        }
    }

    /// Marks the state the session starts in.
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    /// Marks a state reachable from anywhere through `DialogueBuilder::global_on_intent`.
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn with_body(mut self, body: Arc<dyn Body>) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn fallback_state(body: Arc<dyn Body>) -> Self {
        Self {
            fallback: true,
            ..Self::new(super::FALLBACK_STATE).with_body(body)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("has_body", &self.body.is_some())
            .field("rules", &self.rules)
            .field("initial", &self.initial)
            .field("global", &self.global)
            .field("fallback", &self.fallback)
            .finish()
    }
}
