//! WebSocket connection lifecycle: one session per socket.
//!
//! The socket is split: a writer task owns the sink and sends frames from an unbounded queue,
//! a forwarder task turns the session's replies into enveloped JSON on that queue, and the
//! receive loop below feeds user messages into the dialogue one at a time.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use databot::protocol::PongResponse;
use databot::{ClientRequest, OpenDataBot, ReplyReceiver, ServerResponse, Session};
use futures::{SinkExt, StreamExt};
use stream_event::EnvelopeState;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::response::{encode_reply, encode_response, error_response};

pub(crate) async fn handle_socket(
    socket: WebSocket,
    bot: Arc<OpenDataBot>,
    shutdown_tx: Option<oneshot::Sender<()>>,
) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session = %session_id, "connection opened");
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if let Err(e) = sink.send(Message::Text(text)).await {
                warn!("write error (client closed?): {}", e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    let (mut session, replies) = bot.new_session(session_id.clone());
    let forwarder = tokio::spawn(forward_replies(
        replies,
        EnvelopeState::new(session_id.clone()),
        out_tx.clone(),
    ));

    bot.start(&mut session).await;

    while let Some(res) = stream.next().await {
        let msg = match res {
            Ok(m) => m,
            Err(e) => {
                warn!("read error (client closed?): {}", e);
                break;
            }
        };
        let text = match &msg {
            Message::Text(t) => t.clone(),
            Message::Binary(b) => String::from_utf8_lossy(b).into_owned(),
            Message::Close(_) => break,
            _ => continue,
        };
        if out_tx.is_closed() {
            break;
        }
        handle_request(&text, &bot, &mut session, &out_tx).await;
    }

    // Dropping the session closes the reply channel; the forwarder drains and exits.
    drop(session);
    let _ = forwarder.await;
    drop(out_tx);
    let _ = writer.await;
    info!(session = %session_id, "connection closed");

    if let Some(tx) = shutdown_tx {
        let _ = tx.send(());
    }
}

async fn handle_request(
    text: &str,
    bot: &OpenDataBot,
    session: &mut Session,
    out: &mpsc::UnboundedSender<String>,
) {
    let req: ClientRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            let _ = out.send(error_response(None, format!("parse error: {}", e)));
            return;
        }
    };

    match req {
        ClientRequest::UserMessage(m) => {
            if m.message.trim().is_empty() {
                let _ = out.send(error_response(None, "empty message"));
                return;
            }
            debug!(session = %session.id(), "user message");
            bot.handle_message(session, &m.message).await;
        }
        ClientRequest::Reset => {
            debug!(session = %session.id(), "session reset");
            session.reset();
            bot.start(session).await;
        }
        ClientRequest::Ping(r) => {
            let _ = out.send(encode_response(&ServerResponse::Pong(PongResponse {
                id: r.id,
            })));
        }
    }
}

async fn forward_replies(
    mut replies: ReplyReceiver,
    mut envelope: EnvelopeState,
    out: mpsc::UnboundedSender<String>,
) {
    while let Some(outgoing) = replies.recv().await {
        let text = match encode_reply(&outgoing, &mut envelope) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "reply not serializable, dropped");
                continue;
            }
        };
        if out.send(text).is_err() {
            break;
        }
    }
}
