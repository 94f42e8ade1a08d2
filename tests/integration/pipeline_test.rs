// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{create_pipeline, eager_options, start_workers};
use parking_lot::Mutex;
use pipecrawl::domain::models::event::EventLevel;
use pipecrawl::domain::repositories::event_repository::EventRepository;
use pipecrawl::domain::repositories::result_repository::ResultRepository;
use pipecrawl::domain::repositories::run_state_repository::RunStateRepository;
use pipecrawl::domain::services::context::StageContext;
use pipecrawl::domain::services::crawler::CleanupOutcome;
use pipecrawl::operations::OperationRegistry;
use pipecrawl::queue::task_queue::TaskQueue;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const THREE_STAGES: &str = r#"
name: pipe
cleanup_method: "pipe:cleanup"
pipeline:
  init:
    method: emit_once
    next: clean
  clean:
    method: fan_out
    next: store
  store:
    method: record
"#;

fn pipeline_registry(stored: Arc<Mutex<Vec<Value>>>, cleaned: Arc<AtomicUsize>) -> OperationRegistry {
    let mut registry = OperationRegistry::with_builtins();
    registry
        .register_fn("emit_once", |ctx: StageContext, _data: Value| async move {
            ctx.emit(json!({ "page": 1 })).await
        })
        .register_fn("fan_out", |ctx: StageContext, data: Value| async move {
            let page = data["page"].as_i64().unwrap_or_default();
            ctx.emit(json!({ "page": page, "item": "a" })).await?;
            ctx.emit(json!({ "page": page, "item": "b" })).await
        })
        .register_fn("record", move |_ctx: StageContext, data: Value| {
            let stored = stored.clone();
            async move {
                stored.lock().push(data);
                Ok(())
            }
        })
        .register_cleanup_fn("pipe:cleanup", move |_definition| {
            let cleaned = cleaned.clone();
            async move {
                cleaned.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
    registry
}

#[tokio::test]
async fn test_eager_run_drives_every_stage() {
    let stored = Arc::new(Mutex::new(Vec::new()));
    let cleaned = Arc::new(AtomicUsize::new(0));
    let pipeline = create_pipeline(
        &[THREE_STAGES],
        pipeline_registry(stored.clone(), cleaned.clone()),
        eager_options(),
    )
    .await;
    let mut workers = start_workers(&pipeline, 2).await;

    let crawler = pipeline.manager.get("pipe").unwrap();
    let state = crawler.run(None).await.unwrap();
    assert!(state.is_incremental());

    // init 产出一次，clean 产出两次
    let mut items: Vec<String> = stored
        .lock()
        .iter()
        .map(|v| v["item"].as_str().unwrap_or_default().to_string())
        .collect();
    items.sort();
    assert_eq!(items, vec!["a".to_string(), "b".to_string()]);

    let to_store = pipeline
        .runtime
        .stores
        .results
        .find_by_next_stage("pipe", "store")
        .await
        .unwrap();
    assert_eq!(to_store.len(), 2);
    assert!(to_store.iter().all(|r| r.run_id == state.run_id));

    // 每个阶段任务计一次操作
    assert_eq!(pipeline.run_state.total_ops("pipe").await.unwrap(), Some(4));
    assert_eq!(pipeline.run_state.active_ops("pipe").await.unwrap(), Some(0));
    assert_eq!(pipeline.queue.pending("pipe").await.unwrap(), 0);
    assert!(!crawler.is_running().await);

    assert_eq!(crawler.cleanup().await, CleanupOutcome::Completed);
    assert_eq!(crawler.cleanup().await, CleanupOutcome::NotRun);
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);

    workers.shutdown();
}

#[tokio::test]
async fn test_single_stage_run_counts_one_operation() {
    let source = r#"
name: single
pipeline:
  init:
    method: inspect
"#;
    let pipeline = create_pipeline(&[source], OperationRegistry::with_builtins(), eager_options()).await;
    let mut workers = start_workers(&pipeline, 1).await;

    let crawler = pipeline.manager.get("single").unwrap();
    assert_eq!(crawler.get_op_count().await, Some(0));

    crawler.run(Some(false)).await.unwrap();
    assert_eq!(crawler.get_op_count().await, Some(1));

    crawler.run(None).await.unwrap();
    assert_eq!(crawler.get_op_count().await, Some(2));

    workers.shutdown();
}

#[tokio::test]
async fn test_replay_reprocesses_stored_results() {
    let stored = Arc::new(Mutex::new(Vec::new()));
    let pipeline = create_pipeline(
        &[THREE_STAGES],
        pipeline_registry(stored.clone(), Arc::new(AtomicUsize::new(0))),
        eager_options(),
    )
    .await;
    let mut workers = start_workers(&pipeline, 2).await;

    let crawler = pipeline.manager.get("pipe").unwrap();
    crawler.run(None).await.unwrap();
    assert_eq!(stored.lock().len(), 2);

    let dispatched = crawler.replay("store").await.unwrap();
    assert_eq!(dispatched, 2);
    pipeline
        .queue
        .wait_idle("pipe", std::time::Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(stored.lock().len(), 4);

    workers.shutdown();
}

#[tokio::test]
async fn test_failing_operation_records_event_and_drains() {
    let source = r#"
name: fragile
pipeline:
  init:
    method: explode
    next: after
  after:
    method: inspect
"#;
    let mut registry = OperationRegistry::with_builtins();
    registry.register_fn("explode", |_ctx: StageContext, data: Value| async move {
        if data.is_object() {
            panic!("operation exploded");
        }
        Ok(())
    });

    let pipeline = create_pipeline(&[source], registry, eager_options()).await;
    let mut workers = start_workers(&pipeline, 1).await;

    let crawler = pipeline.manager.get("fragile").unwrap();
    crawler.run(None).await.unwrap();

    let events = pipeline
        .runtime
        .stores
        .events
        .find_by_crawler("fragile", 10)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, EventLevel::Error);
    assert_eq!(events[0].stage, "init");
    assert!(events[0].message.contains("operation exploded"));

    // 失败的操作同样计数，且不会留下活动计数
    assert_eq!(crawler.get_op_count().await, Some(1));
    assert!(!crawler.is_running().await);

    // 工作器在 panic 后继续工作
    crawler.run(None).await.unwrap();
    assert_eq!(crawler.get_op_count().await, Some(2));

    workers.shutdown();
}

#[tokio::test]
async fn test_tags_round_trip_through_context() {
    let source = r#"
name: tagger
pipeline:
  init:
    method: remember
"#;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let observed = seen.clone();
    let mut registry = OperationRegistry::with_builtins();
    registry.register_fn("remember", move |ctx: StageContext, _data: Value| {
        let observed = observed.clone();
        async move {
            let known = ctx.check_tag("cursor").await?;
            let previous = ctx.get_tag("cursor").await?;
            ctx.set_tag("cursor", json!({ "run": ctx.run_id() })).await?;
            observed.lock().push((known, previous));
            Ok(())
        }
    });

    let pipeline = create_pipeline(&[source], registry, eager_options()).await;
    let mut workers = start_workers(&pipeline, 1).await;

    let crawler = pipeline.manager.get("tagger").unwrap();
    let first = crawler.run(None).await.unwrap();
    crawler.run(None).await.unwrap();

    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], (false, None));
    assert_eq!(seen[1], (true, Some(json!({ "run": first.run_id }))));

    workers.shutdown();
}
