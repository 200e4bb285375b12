//! WebSocket message types.
//!
//! - Requests (client → server): [`ClientRequest`], tagged by `type`.
//! - Responses (server → client): bot replies are `stream_event::ReplyEvent` objects with the
//!   envelope injected; everything else is a [`ServerResponse`].

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Requests (client → server)
// -----------------------------------------------------------------------------

/// One user utterance for the connection's session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserMessageRequest {
    pub message: String,
}

/// Ping request: health / keepalive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingRequest {
    pub id: String,
}

/// Client-to-server request envelope.
///
/// Each variant maps to a JSON object with `"type": "<variant_name>"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    UserMessage(UserMessageRequest),
    /// Forget the conversation and greet again.
    Reset,
    Ping(PingRequest),
}

// -----------------------------------------------------------------------------
// Responses (server → client)
// -----------------------------------------------------------------------------

/// Pong: response to ping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PongResponse {
    pub id: String,
}

/// Error response for a request the server could not handle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub error: String,
}

/// Server-to-client control messages (replies travel as reply events).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerResponse {
    Pong(PongResponse),
    Error(ErrorResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_user_message_parses() {
        let parsed: ClientRequest =
            serde_json::from_str(r#"{"type":"user_message","message":"hello"}"#).unwrap();
        match parsed {
            ClientRequest::UserMessage(m) => assert_eq!(m.message, "hello"),
            other => panic!("expected user_message, got {:?}", other),
        }
    }

    #[test]
    fn request_reset_and_ping_parse() {
        let reset: ClientRequest = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert!(matches!(reset, ClientRequest::Reset));
        let json = serde_json::to_string(&ClientRequest::Ping(PingRequest {
            id: "p1".to_string(),
        }))
        .unwrap();
        assert_eq!(json, r#"{"type":"ping","id":"p1"}"#);
    }

    #[test]
    fn response_error_skips_missing_id() {
        let json = serde_json::to_string(&ServerResponse::Error(ErrorResponse {
            id: None,
            error: "bad request".to_string(),
        }))
        .unwrap();
        assert_eq!(json, r#"{"type":"error","error":"bad request"}"#);
    }
}
