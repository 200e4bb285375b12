use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::common;

#[tokio::test]
async fn e2e_invalid_json_returns_error() {
    let (url, server_handle) = common::spawn_server_once(common::test_bot(1)).await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text("not valid json".to_string()))
        .await
        .unwrap();
    let (err, _) = common::recv_until(&mut read, "error").await.unwrap();

    let text = err["error"].as_str().unwrap_or("");
    assert!(text.contains("parse"), "expected parse error, got: {}", err);
    assert!(err.get("id").is_none());

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
