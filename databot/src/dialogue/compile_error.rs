//! Dialogue compilation error.
//!
//! Returned by `DialogueBuilder::compile` when the declared states and rules do not form a
//! usable state machine.

use thiserror::Error;

/// Error when compiling a dialogue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// No state was marked `initial()`.
    #[error("dialogue has no initial state")]
    MissingInitial,

    /// More than one state was marked `initial()`.
    #[error("dialogue has more than one initial state: {0:?}")]
    MultipleInitial(Vec<String>),

    /// Two states share a name.
    #[error("duplicate state: {0}")]
    DuplicateState(String),

    /// Two intents share a name.
    #[error("duplicate intent: {0}")]
    DuplicateIntent(String),

    /// A rule references a state that was never added.
    #[error("state not found: {0}")]
    StateNotFound(String),

    /// A rule references an intent that was never added.
    #[error("intent not found: {0}")]
    IntentNotFound(String),

    /// `global_on_intent` targets a state not marked `global()`.
    #[error("global rule target is not a global state: {0}")]
    GlobalTargetNotGlobal(String),
}
