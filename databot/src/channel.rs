//! Reply channel from the dialogue engine to a presentation layer.
//!
//! Unbounded and FIFO: a session pushes replies while its body runs and the consumer (WebSocket
//! writer, CLI printer) drains them in emission order. Sending never blocks a body; a closed
//! receiver only drops replies.

use stream_event::ReplyEvent;
use tokio::sync::mpsc;
use tracing::trace;

use crate::dataset::DatasetRecord;

/// One reply, as produced by a state body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Datasets(Vec<DatasetRecord>),
    Options(Vec<String>),
}

impl Reply {
    /// Wire shape of this reply (no envelope).
    pub fn to_event(&self) -> Result<ReplyEvent, serde_json::Error> {
        Ok(match self {
            Reply::Text(message) => ReplyEvent::Text {
                message: message.clone(),
            },
            Reply::Datasets(records) => ReplyEvent::Datasets {
                datasets: serde_json::to_value(records)?,
            },
            Reply::Options(options) => ReplyEvent::Options {
                options: options.clone(),
            },
        })
    }

    /// Rebuilds a reply from its wire shape.
    pub fn from_event(event: ReplyEvent) -> Result<Self, serde_json::Error> {
        Ok(match event {
            ReplyEvent::Text { message } => Reply::Text(message),
            ReplyEvent::Datasets { datasets } => {
                Reply::Datasets(serde_json::from_value::<Vec<DatasetRecord>>(datasets)?)
            }
            ReplyEvent::Options { options } => Reply::Options(options),
        })
    }
}

/// A reply tagged with the dialogue state that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outgoing {
    pub state: String,
    pub reply: Reply,
}

/// Sending half, owned by a session.
#[derive(Clone, Debug)]
pub struct ReplySender {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl ReplySender {
    /// Queues `reply`; returns false when the consumer is gone.
    pub fn send(&self, state: &str, reply: Reply) -> bool {
        trace!(state = %state, ?reply, "reply queued");
        self.tx
            .send(Outgoing {
                state: state.to_string(),
                reply,
            })
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the presentation layer.
#[derive(Debug)]
pub struct ReplyReceiver {
    rx: mpsc::UnboundedReceiver<Outgoing>,
}

impl ReplyReceiver {
    /// Next reply; `None` once every sender is dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<Outgoing> {
        self.rx.recv().await
    }

    /// Next queued reply without waiting.
    pub fn try_recv(&mut self) -> Option<Outgoing> {
        self.rx.try_recv().ok()
    }

    /// Every reply queued so far, in order.
    pub fn drain(&mut self) -> Vec<Outgoing> {
        let mut out = Vec::new();
        while let Some(item) = self.try_recv() {
            out.push(item);
        }
        out
    }
}

pub fn reply_channel() -> (ReplySender, ReplyReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReplySender { tx }, ReplyReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DatasetRecord {
        DatasetRecord {
            source: "https://a.example".into(),
            title: "T".into(),
            date: "2020-01-02".into(),
            description: "D".into(),
            organization: "Unknown".into(),
            url: "https://files.example/1.csv".into(),
        }
    }

    #[tokio::test]
    async fn replies_arrive_in_emission_order() {
        let (tx, mut rx) = reply_channel();
        assert!(tx.send("s", Reply::Text("one".into())));
        assert!(tx.send("s", Reply::Datasets(vec![record()])));
        assert!(tx.send("t", Reply::Options(vec!["a".into()])));
        drop(tx);
        let got: Vec<_> = std::iter::from_fn(|| rx.try_recv()).collect();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].reply, Reply::Text("one".into()));
        assert!(matches!(got[1].reply, Reply::Datasets(_)));
        assert_eq!(got[2].state, "t");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn send_after_receiver_drop_reports_false() {
        let (tx, rx) = reply_channel();
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.send("s", Reply::Text("lost".into())));
    }

    #[test]
    fn dataset_reply_uses_presentation_field_names() {
        let event = Reply::Datasets(vec![record()]).to_event().unwrap();
        let value = event.to_value().unwrap();
        assert_eq!(value["type"], "datasets");
        let first = &value["datasets"][0];
        assert_eq!(first["dataset_source"], "https://a.example");
        assert_eq!(first["dataset_title"], "T");
        assert_eq!(first["dataset_date"], "2020-01-02");
        assert_eq!(first["dataset_description"], "D");
        assert_eq!(first["dataset_organization"], "Unknown");
        assert_eq!(first["dataset_url"], "https://files.example/1.csv");
        assert_eq!(
            Reply::from_event(event).unwrap(),
            Reply::Datasets(vec![record()])
        );
    }
}
