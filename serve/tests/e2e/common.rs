//! Shared helpers for e2e tests. Received frames are logged with `[e2e] received: ...`.
//! Run tests with `--nocapture` to see them.

use std::sync::Arc;
use std::time::Duration;

use databot::portal::search_url;
use databot::{
    BotServices, DatasetFinder, MockHttpClient, MockLlm, OpenDataBot, PortalClient,
    PortalRegistry, SimpleIntentClassifier, TagStore,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

pub const PORTAL: &str = "https://portal.example";

/// Bot with one portal holding `datasets` live csv resources for the tag `health`.
pub fn test_bot(datasets: usize) -> Arc<OpenDataBot> {
    let data: Vec<Value> = (0..datasets)
        .map(|i| {
            json!({
                "id": i.to_string(),
                "title": format!("Health {}", i),
                "description": "hospital beds",
                "organization": {"name": "Ministry of Health"},
                "resources": [{"format": "csv", "url": format!("{}/r/{}.csv", PORTAL, i),
                               "created_at": "2022-01-02T03:04:05"}],
                "tags": ["health"]
            })
        })
        .collect();
    let mut http = MockHttpClient::new().with_get(
        search_url(PORTAL, "health", "csv").unwrap(),
        json!({"data": data, "next_page": null}).to_string(),
    );
    for i in 0..datasets {
        http = http.with_head(format!("{}/r/{}.csv", PORTAL, i), 200);
    }
    let finder = DatasetFinder::new(
        PortalClient::new(Arc::new(http), "csv"),
        PortalRegistry::new([PORTAL]),
        Arc::new(TagStore::with_tags("unused-tags.json", ["health"])),
    );
    let bot = OpenDataBot::new(
        BotServices::new(finder, Arc::new(MockLlm::fixed("Hello from the test bot!"))),
        Arc::new(SimpleIntentClassifier::new()),
        0.5,
    )
    .unwrap();
    Arc::new(bot)
}

/// Bind to a random port and spawn the server in once mode. Returns (ws_url, server_handle).
pub async fn spawn_server_once(
    bot: Arc<OpenDataBot>,
) -> (
    String,
    tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("ws://{}", addr);
    let server_handle = tokio::spawn(serve::run_serve_on_listener(listener, bot, true));
    (url, server_handle)
}

pub async fn send<W>(write: &mut W, request: Value)
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::fmt::Debug,
{
    write
        .send(Message::Text(request.to_string()))
        .await
        .unwrap();
}

/// Next text frame as JSON.
pub async fn recv_json<R>(read: &mut R) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>
where
    R: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let opt = timeout(Duration::from_secs(10), read.next())
            .await
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout waiting for frame")
            })?;
        let msg = opt
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no message"))??;
        if !msg.is_text() {
            continue;
        }
        let text = msg
            .to_text()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        eprintln!("[e2e] received: {}", text);
        return Ok(serde_json::from_str(text)?);
    }
}

/// Reads frames until one has `"type": wanted`; returns it and everything before it.
pub async fn recv_until<R>(
    read: &mut R,
    wanted: &str,
) -> Result<(Value, Vec<Value>), Box<dyn std::error::Error + Send + Sync>>
where
    R: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let mut before = Vec::new();
    loop {
        let frame = recv_json(read).await?;
        if frame["type"] == wanted {
            return Ok((frame, before));
        }
        before.push(frame);
    }
}
