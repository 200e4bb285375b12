use futures_util::StreamExt;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;

use super::common;

/// **Scenario**: The bot greets on connect and again after a reset, numbering events per session.
#[tokio::test]
async fn e2e_greets_on_connect_and_after_reset() {
    let (url, server_handle) = common::spawn_server_once(common::test_bot(1)).await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();

    let greeting = common::recv_json(&mut read).await.unwrap();
    assert_eq!(greeting["type"], "text");
    assert_eq!(greeting["message"], "Hello from the test bot!");
    assert_eq!(greeting["state"], "greetings_state");
    assert_eq!(greeting["event_id"], 1);
    let session_id = greeting["session_id"].as_str().unwrap().to_string();
    assert!(!session_id.is_empty());

    let options = common::recv_json(&mut read).await.unwrap();
    assert_eq!(options["type"], "options");
    assert_eq!(options["event_id"], 2);

    common::send(&mut write, json!({"type": "reset"})).await;
    let again = common::recv_json(&mut read).await.unwrap();
    assert_eq!(again["message"], "Hello from the test bot!");
    assert_eq!(again["session_id"], session_id.as_str());
    assert_eq!(again["event_id"], 3);

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
