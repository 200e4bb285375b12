//! Envelope (session_id, state, event_id) injected into every reply.
//! EnvelopeState tracks the session's dialogue state and numbers events.

use crate::event::ReplyEvent;
use serde_json::Value;

/// Envelope fields added to each message.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    /// Session ID; constant within a session.
    pub session_id: Option<String>,
    /// Dialogue state the session was in when the reply was produced.
    pub state: Option<String>,
    /// Per-message sequence number; monotonically increasing within a session.
    pub event_id: Option<u64>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_event_id(mut self, id: u64) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Merges envelope fields into the given JSON object (top-level only).
    /// Does not overwrite existing keys.
    pub fn inject_into(&self, obj: &mut Value) {
        let Some(obj) = obj.as_object_mut() else {
            return;
        };
        if let Some(ref id) = self.session_id {
            obj.entry("session_id")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(ref state) = self.state {
            obj.entry("state")
                .or_insert_with(|| Value::String(state.clone()));
        }
        if let Some(id) = self.event_id {
            obj.entry("event_id")
                .or_insert_with(|| Value::Number(serde_json::Number::from(id)));
        }
    }
}

/// Envelope state for one session: session_id, current dialogue state, next event_id.
pub struct EnvelopeState {
    pub session_id: String,
    pub current_state: String,
    pub next_event_id: u64,
}

impl EnvelopeState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            current_state: String::new(),
            next_event_id: 1,
        }
    }

    pub fn set_state(&mut self, state: impl Into<String>) {
        self.current_state = state.into();
    }

    /// Builds the envelope for the next event without advancing.
    pub fn next_envelope(&self) -> Envelope {
        let env = Envelope::new()
            .with_session_id(&self.session_id)
            .with_event_id(self.next_event_id);
        if self.current_state.is_empty() {
            env
        } else {
            env.with_state(&self.current_state)
        }
    }

    /// Injects envelope into the event value and advances the event counter.
    pub fn inject_into(&mut self, value: &mut Value) {
        self.next_envelope().inject_into(value);
        self.next_event_id += 1;
    }
}

/// Converts a reply event to JSON and injects envelope using the given state.
/// Returns the final value (type + payload + session_id, state, event_id).
pub fn to_json(event: &ReplyEvent, state: &mut EnvelopeState) -> Result<Value, serde_json::Error> {
    let mut value = event.to_value()?;
    state.inject_into(&mut value);
    Ok(value)
}
