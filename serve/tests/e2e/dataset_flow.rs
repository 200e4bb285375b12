use futures_util::StreamExt;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;

use super::common;

/// **Scenario**: A dataset request over the socket yields a text reply then the dataset list.
#[tokio::test]
async fn e2e_dataset_request_returns_records() {
    let (url, server_handle) = common::spawn_server_once(common::test_bot(2)).await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();
    common::recv_until(&mut read, "options").await.unwrap();

    common::send(
        &mut write,
        json!({"type": "user_message", "message": "Can you give me a health dataset"}),
    )
    .await;
    let (datasets, before) = common::recv_until(&mut read, "datasets").await.unwrap();

    assert_eq!(before.len(), 1);
    assert_eq!(before[0]["message"], "I found 2 datasets mentioning health.");
    assert_eq!(datasets["state"], "dataset_request_state");
    let list = datasets["datasets"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["dataset_url"], "https://portal.example/r/0.csv");
    assert_eq!(list[0]["dataset_organization"], "Ministry of Health");
    assert_eq!(list[0]["dataset_date"], "2022-01-02");
    assert_eq!(list[0]["dataset_title"], "Health 0");

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}

/// **Scenario**: An empty user message is rejected without touching the dialogue.
#[tokio::test]
async fn e2e_empty_message_is_an_error() {
    let (url, server_handle) = common::spawn_server_once(common::test_bot(1)).await;

    let (ws, _) = connect_async(&url).await.unwrap();
    let (mut write, mut read) = ws.split();
    common::recv_until(&mut read, "options").await.unwrap();

    common::send(&mut write, json!({"type": "user_message", "message": "   "})).await;
    let (err, before) = common::recv_until(&mut read, "error").await.unwrap();

    assert!(before.is_empty());
    assert_eq!(err["error"], "empty message");

    drop(write);
    drop(read);
    let _ = timeout(Duration::from_secs(5), server_handle).await;
}
