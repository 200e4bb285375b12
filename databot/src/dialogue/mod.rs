//! Intent-based dialogue state machine.
//!
//! A [`DialogueBuilder`] declares intents, states and ordered transition rules; `compile` checks
//! every reference and yields a shared, immutable [`Dialogue`]. Each session keeps its own
//! current-state pointer and is moved by [`Dialogue::start`] and [`Dialogue::advance`].

mod builder;
mod classifier;
mod compile_error;
mod intent;
mod runtime;
mod state;

pub use builder::{DialogueBuilder, DEFAULT_FALLBACK_REPLY, DEFAULT_INTENT_THRESHOLD};
pub use classifier::{IntentClassifier, LlmIntentClassifier, SimpleIntentClassifier};
pub use compile_error::CompileError;
pub use intent::{Intent, IntentParameter, IntentPrediction};
pub use runtime::{Dialogue, MAX_HOPS};
pub use state::{Body, FnBody, Predicate, ReplyBody, State, TransitionRule, Trigger};

/// Name of the synthetic state holding the fallback body.
pub const FALLBACK_STATE: &str = "__fallback__";
