//! Encoding of outgoing frames: control responses and enveloped bot replies.

use databot::protocol::ErrorResponse;
use databot::{Outgoing, ServerResponse};
use stream_event::{to_json, EnvelopeState};

/// JSON text for a control response.
pub(crate) fn encode_response(response: &ServerResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|_| {
        r#"{"type":"error","error":"serialization error"}"#.to_string()
    })
}

pub(crate) fn error_response(id: Option<String>, error: impl Into<String>) -> String {
    encode_response(&ServerResponse::Error(ErrorResponse {
        id,
        error: error.into(),
    }))
}

/// JSON text for one bot reply with `session_id`, `state` and `event_id` injected.
pub(crate) fn encode_reply(
    outgoing: &Outgoing,
    envelope: &mut EnvelopeState,
) -> Result<String, serde_json::Error> {
    envelope.set_state(outgoing.state.clone());
    let event = outgoing.reply.to_event()?;
    Ok(to_json(&event, envelope)?.to_string())
}
