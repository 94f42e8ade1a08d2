// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use pipecrawl::domain::models::task::{CrawlState, Task};
use pipecrawl::domain::repositories::run_state_repository::{keys, RunStateRepository};
use pipecrawl::infrastructure::cache::redis_client::RedisClient;
use pipecrawl::infrastructure::cache::redis_run_state::RedisRunStateRepository;
use pipecrawl::queue::redis_queue::RedisTaskQueue;
use pipecrawl::queue::task_queue::{QueueError, TaskQueue};
use pipecrawl::utils::errors::RunStateError;
use serde_json::json;
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};
use uuid::Uuid;

const TTL: Duration = Duration::from_secs(300);

async fn start_redis() -> (ContainerAsync<GenericImage>, RedisClient) {
    let node = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379.tcp())
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
        .start()
        .await
        .expect("Failed to start Redis");
    let port = node
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get Redis port");
    let client = RedisClient::new(&format!("redis://127.0.0.1:{}", port))
        .await
        .unwrap();
    client.ping().await.unwrap();
    (node, client)
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_run_state_counters() {
    let (_node, client) = start_redis().await;
    let store = RedisRunStateRepository::new(client.clone());

    assert_eq!(store.last_run("news").await.unwrap(), None);
    assert_eq!(store.active_ops("news").await.unwrap(), None);
    assert_eq!(store.total_ops("news").await.unwrap(), None);

    let now = Utc::now();
    store.set_last_run("news", now, TTL).await.unwrap();
    let stored = store.last_run("news").await.unwrap().unwrap();
    assert_eq!(stored.timestamp_millis(), now.timestamp_millis());

    assert_eq!(store.begin_op("news", TTL).await.unwrap(), 1);
    assert_eq!(store.begin_op("news", TTL).await.unwrap(), 2);
    store.finish_op("news", TTL).await.unwrap();
    assert_eq!(store.active_ops("news").await.unwrap(), Some(1));
    assert_eq!(store.total_ops("news").await.unwrap(), Some(1));

    store.reset("news").await.unwrap();
    assert_eq!(store.active_ops("news").await.unwrap(), None);
    assert_eq!(store.last_run("news").await.unwrap(), None);

    client
        .set(&keys::total_ops("news"), "many", 60)
        .await
        .unwrap();
    assert!(matches!(
        store.total_ops("news").await,
        Err(RunStateError::Corrupt { .. })
    ));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_queue_tracks_pending() {
    let (_node, client) = start_redis().await;
    let queue = RedisTaskQueue::new(client);

    let first = Task::new(CrawlState::fresh("news"), "init", json!({}));
    let second = Task::new(CrawlState::fresh("news"), "store", json!({ "n": 2 }));
    queue.enqueue(first.clone()).await.unwrap();
    queue.enqueue(second.clone()).await.unwrap();
    assert_eq!(queue.pending("news").await.unwrap(), 2);

    let task = queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(task.id, first.id);
    assert_eq!(task.attempt, 1);
    queue.complete(&task).await.unwrap();

    let task = queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(task.id, second.id);
    queue.fail(&task).await.unwrap();

    assert_eq!(queue.pending("news").await.unwrap(), 0);
    assert!(queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
    queue
        .wait_idle("news", Duration::from_secs(1))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_queue_dead_letters_undecodable_task() {
    let (_node, client) = start_redis().await;
    let queue = RedisTaskQueue::new(client.clone());

    client.incr("pipecrawl:pending:news").await.unwrap();
    client
        .lpush("pipecrawl:queue", r#"{"crawler":"news","stage":7}"#)
        .await
        .unwrap();
    assert_eq!(queue.pending("news").await.unwrap(), 1);

    assert!(matches!(
        queue.dequeue(Uuid::new_v4()).await,
        Err(QueueError::Serialization(_))
    ));
    assert_eq!(queue.pending("news").await.unwrap(), 0);
    assert_eq!(client.llen("pipecrawl:dead").await.unwrap(), 1);
    assert_eq!(client.llen("pipecrawl:processing").await.unwrap(), 0);
    queue
        .wait_idle("news", Duration::from_secs(1))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_queue_recovers_unacknowledged_task() {
    let (_node, client) = start_redis().await;
    let queue = RedisTaskQueue::new(client.clone());

    let task = Task::new(CrawlState::fresh("news"), "init", json!({}));
    queue.enqueue(task.clone()).await.unwrap();

    // 取出后不确认，模拟进程退出
    let taken = queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(taken.id, task.id);
    assert!(queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
    assert_eq!(client.llen("pipecrawl:processing").await.unwrap(), 1);

    let restarted = RedisTaskQueue::new(client.clone());
    assert_eq!(restarted.recover_in_flight().await.unwrap(), 1);
    assert_eq!(restarted.pending("news").await.unwrap(), 1);

    let again = restarted.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(again.id, task.id);
    assert_eq!(again.attempt, 1);
    restarted.complete(&again).await.unwrap();
    assert_eq!(restarted.pending("news").await.unwrap(), 0);
    assert_eq!(client.llen("pipecrawl:processing").await.unwrap(), 0);
}
