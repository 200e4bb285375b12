use super::common;
use futures_util::StreamExt;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;

#[tokio::test]
async fn e2e_ping() {
    let (url, server_handle) = common::spawn_server_once(common::test_bot(1)).await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    common::send(&mut write, json!({"type": "ping", "id": "ping-1"})).await;
    let (pong, _) = common::recv_until(&mut read, "pong").await.unwrap();

    assert_eq!(pong["id"], "ping-1");

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
