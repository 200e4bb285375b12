//! Compiled dialogue: per-session state transitions.
//!
//! The graph is immutable and shared by every session; only `Session::current` moves.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::classifier::IntentClassifier;
use super::intent::Intent;
use super::state::{State, TransitionRule, Trigger};
use crate::session::Session;

/// Event-less transitions followed in one go before giving up.
pub const MAX_HOPS: usize = 32;

/// Immutable state machine produced by `DialogueBuilder::compile`.
pub struct Dialogue {
    intents: Vec<Intent>,
    states: HashMap<String, State>,
    initial: String,
    global_rules: Vec<TransitionRule>,
    fallback: State,
    classifier: Arc<dyn IntentClassifier>,
    intent_threshold: f32,
}

impl fmt::Debug for Dialogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut states: Vec<&str> = self.states.keys().map(String::as_str).collect();
        states.sort_unstable();
        f.debug_struct("Dialogue")
            .field("initial", &self.initial)
            .field("states", &states)
            .field("global_rules", &self.global_rules.len())
            .field("fallback", &self.fallback.name())
            .field("intent_threshold", &self.intent_threshold)
            .finish()
    }
}

impl Dialogue {
    pub(crate) fn new(
        intents: Vec<Intent>,
        states: HashMap<String, State>,
        initial: String,
        global_rules: Vec<TransitionRule>,
        fallback: State,
        classifier: Arc<dyn IntentClassifier>,
        intent_threshold: f32,
    ) -> Self {
        Self {
            intents,
            states,
            initial,
            global_rules,
            fallback,
            classifier,
            intent_threshold,
        }
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn initial_state(&self) -> &str {
        &self.initial
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    pub fn intent_threshold(&self) -> f32 {
        self.intent_threshold
    }

    /// Puts the session in the initial state and runs it.
    pub async fn start(&self, session: &mut Session) {
        session.take_return_to();
        self.enter(session, self.initial.clone()).await;
    }

    /// Handles one user message: classify, pick a transition, run the target state.
    ///
    /// Global rules are tried first, then the current state's rules in declaration order. When
    /// nothing matches the fallback body runs and the session stays where it is.
    pub async fn advance(&self, session: &mut Session, text: &str) {
        session.record_user_message(text);

        let prediction = self
            .classifier
            .classify(text, &self.intents)
            .await
            .filter(|p| {
                let accepted = p.score >= self.intent_threshold;
                if !accepted {
                    debug!(intent = %p.intent, score = p.score, "prediction below threshold");
                }
                accepted
            });
        let intent = prediction.as_ref().map(|p| p.intent.clone());
        session.set_prediction(prediction);
        let trigger = Trigger::Message {
            intent: intent.as_deref(),
        };

        if let Some(rule) = self
            .global_rules
            .iter()
            .find(|r| r.predicate.matches(session, trigger))
        {
            let current = session.current().to_string();
            let from_global = self.states.get(&current).map_or(false, |s| s.global);
            if !from_global {
                session.set_return_to(Some(current));
            }
            debug!(session = %session.id(), target = %rule.target, "global transition");
            self.enter(session, rule.target.clone()).await;
            return;
        }

        let current = match self.states.get(session.current()) {
            Some(state) => state,
            None => {
                warn!(session = %session.id(), state = %session.current(), "unknown current state, using initial");
                match self.states.get(&self.initial) {
                    Some(state) => state,
                    None => return,
                }
            }
        };
        if let Some(rule) = current
            .rules
            .iter()
            .find(|r| r.predicate.matches(session, trigger))
        {
            debug!(session = %session.id(), from = %current.name, target = %rule.target, "transition");
            session.take_return_to();
            self.enter(session, rule.target.clone()).await;
            return;
        }

        debug!(session = %session.id(), state = %current.name, intent = ?intent, "no rule matched, fallback");
        if let Some(body) = &self.fallback.body {
            body.run(session).await;
        }
    }

    /// Runs `target` and follows event-less rules until the session rests.
    async fn enter(&self, session: &mut Session, target: String) {
        let mut next = target;
        for _ in 0..MAX_HOPS {
            let Some(state) = self.states.get(&next) else {
                warn!(session = %session.id(), state = %next, "unknown target state");
                return;
            };
            session.set_current(&next);
            debug!(session = %session.id(), state = %next, "entered state");
            if let Some(body) = &state.body {
                body.run(session).await;
            }

            match state
                .rules
                .iter()
                .find(|r| r.predicate.matches(session, Trigger::BodyDone))
            {
                Some(rule) => {
                    session.take_return_to();
                    next = rule.target.clone();
                }
                None => {
                    if state.global {
                        if let Some(back) = session.take_return_to() {
                            debug!(session = %session.id(), state = %back, "returned from global state");
                            session.set_current(&back);
                        }
                    }
                    return;
                }
            }
        }
        warn!(session = %session.id(), state = %next, "hop limit reached, resting");
    }
}
