// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::domain::models::crawler::DefinitionDefaults;
use crate::domain::models::crawler_result::StageResult;
use crate::domain::models::task::Task;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::repositories::run_state_repository::RunStateRepository;
use crate::domain::services::runtime::RuntimeOptions;
use crate::infrastructure::cache::memory_run_state::InMemoryRunStateRepository;
use crate::infrastructure::repositories::database_stores;
use crate::operations::OperationRegistry;
use crate::queue::memory_queue::InMemoryTaskQueue;
use crate::queue::task_queue::TaskQueue;
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use mockall::mock;
use parking_lot::Mutex;
use sea_orm::Database;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use uuid::Uuid;

mock! {
    pub RunState {}
    #[async_trait]
    impl RunStateRepository for RunState {
        async fn last_run(&self, crawler: &str) -> Result<Option<DateTime<Utc>>, RunStateError>;
        async fn set_last_run(&self, crawler: &str, at: DateTime<Utc>, ttl: Duration) -> Result<(), RunStateError>;
        async fn active_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError>;
        async fn total_ops(&self, crawler: &str) -> Result<Option<i64>, RunStateError>;
        async fn begin_op(&self, crawler: &str, ttl: Duration) -> Result<i64, RunStateError>;
        async fn finish_op(&self, crawler: &str, ttl: Duration) -> Result<(), RunStateError>;
        async fn reset(&self, crawler: &str) -> Result<(), RunStateError>;
    }
}

mock! {
    pub BrokenQueue {}
    #[async_trait]
    impl TaskQueue for BrokenQueue {
        async fn enqueue(&self, task: Task) -> Result<Task, QueueError>;
        async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Task>, QueueError>;
        async fn complete(&self, task: &Task) -> Result<(), QueueError>;
        async fn fail(&self, task: &Task) -> Result<(), QueueError>;
        async fn pending(&self, crawler: &str) -> Result<u64, QueueError>;
    }
}

const DAILY: &str = r#"
name: news
schedule: daily
cleanup_method: "news:cleanup"
pipeline:
  init:
    method: seed
    params: { urls: ["https://example.com/a"] }
    next: clean
  clean:
    method: inspect
    next: store
  store:
    method: inspect
"#;

struct Harness {
    crawler: Crawler,
    queue: Arc<InMemoryTaskQueue>,
    runtime: Arc<CrawlerRuntime>,
}

async fn harness(
    source: &str,
    run_state: Option<Arc<dyn RunStateRepository>>,
    registry: OperationRegistry,
) -> Harness {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let queue = Arc::new(InMemoryTaskQueue::new());
    let definition =
        CrawlerDefinition::from_yaml(source, "news", &DefinitionDefaults::default(), &registry)
            .unwrap();
    let runtime = Arc::new(CrawlerRuntime::new(
        queue.clone(),
        run_state,
        database_stores(Arc::new(db)),
        Arc::new(registry),
        RuntimeOptions::default(),
    ));

    Harness {
        crawler: Crawler::new(definition, runtime.clone()),
        queue,
        runtime,
    }
}

fn failing_store() -> MockRunState {
    let mut store = MockRunState::new();
    store
        .expect_last_run()
        .returning(|_| Err(RunStateError::Unavailable("connection refused".into())));
    store
        .expect_active_ops()
        .returning(|_| Err(RunStateError::Unavailable("connection refused".into())));
    store
        .expect_total_ops()
        .returning(|_| Err(RunStateError::Unavailable("connection refused".into())));
    store
}

#[tokio::test]
async fn test_check_due_daily_scenario() {
    let store = Arc::new(InMemoryRunStateRepository::new());
    let h = harness(DAILY, Some(store.clone()), OperationRegistry::with_builtins()).await;

    assert!(h.crawler.check_due().await, "never run means due");

    h.crawler.run(None).await.unwrap();
    let last_run = store.last_run("news").await.unwrap().unwrap();
    assert!(Utc::now() - last_run < chrono::Duration::seconds(5));
    assert!(!h.crawler.check_due().await);

    let later = Utc::now() + chrono::Duration::hours(25);
    assert!(h.crawler.check_due_at(later).await);
    let exactly = last_run + chrono::Duration::days(1);
    assert!(h.crawler.check_due_at(exactly).await);
    assert!(!h
        .crawler
        .check_due_at(exactly - chrono::Duration::seconds(1))
        .await);
}

#[tokio::test]
async fn test_check_due_false_when_disabled_or_unscheduled() {
    let store: Arc<dyn RunStateRepository> = Arc::new(InMemoryRunStateRepository::new());

    let disabled = DAILY.replace("schedule: daily", "schedule: daily\ndisabled: true");
    let h = harness(&disabled, Some(store.clone()), OperationRegistry::with_builtins()).await;
    assert!(!h.crawler.check_due().await);

    let unscheduled = DAILY.replace("schedule: daily", "schedule: none");
    let h = harness(&unscheduled, Some(store), OperationRegistry::with_builtins()).await;
    assert!(!h.crawler.check_due().await);
}

#[tokio::test]
async fn test_degraded_without_store() {
    let h = harness(DAILY, None, OperationRegistry::with_builtins()).await;

    assert!(!h.crawler.check_due().await);
    assert!(!h.crawler.is_running().await);
    assert_eq!(h.crawler.get_op_count().await, None);
    assert!(!h.crawler.reset_run_state().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_store_reads_as_unknown() {
    let h = harness(
        DAILY,
        Some(Arc::new(failing_store())),
        OperationRegistry::with_builtins(),
    )
    .await;

    assert!(!h.crawler.check_due().await);
    assert!(!h.crawler.is_running().await);
    assert_eq!(h.crawler.get_op_count().await, None);
}

#[tokio::test]
async fn test_is_running_by_live_counter() {
    let store = Arc::new(InMemoryRunStateRepository::new());
    let h = harness(DAILY, Some(store.clone()), OperationRegistry::with_builtins()).await;

    assert!(!h.crawler.is_running().await, "absent counter");
    assert_eq!(h.crawler.get_op_count().await, Some(0), "never ran");

    for (value, running) in [(0, false), (-1, false), (1, true), (7, true)] {
        store.set_active_ops("news", value);
        assert_eq!(h.crawler.is_running().await, running, "live = {}", value);
    }
}

#[tokio::test]
async fn test_run_dispatches_init_with_empty_data() {
    let h = harness(DAILY, None, OperationRegistry::with_builtins()).await;

    let state = h.crawler.run(Some(false)).await.unwrap();
    assert_eq!(state.crawler, "news");
    assert_eq!(state.incremental, Some(false));

    let task = h.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(task.stage, "init");
    assert_eq!(task.data, json!({}));
    assert_eq!(task.state, state);
    assert!(h.queue.dequeue(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_dispatch_keeps_crawler_due() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let mut queue = MockBrokenQueue::new();
    queue
        .expect_enqueue()
        .times(1)
        .returning(|_| Err(QueueError::Transport("connection reset".into())));

    let store = Arc::new(InMemoryRunStateRepository::new());
    let registry = OperationRegistry::with_builtins();
    let definition =
        CrawlerDefinition::from_yaml(DAILY, "news", &DefinitionDefaults::default(), &registry)
            .unwrap();
    let runtime = Arc::new(CrawlerRuntime::new(
        Arc::new(queue),
        Some(store.clone()),
        database_stores(Arc::new(db)),
        Arc::new(registry),
        RuntimeOptions::default(),
    ));
    let crawler = Crawler::new(definition, runtime);

    assert!(matches!(
        crawler.run(None).await,
        Err(CrawlerError::Queue(QueueError::Transport(_)))
    ));
    assert_eq!(store.last_run("news").await.unwrap(), None);
    assert!(crawler.check_due().await);
    assert_eq!(crawler.cleanup().await, CleanupOutcome::NotRun);
}

#[tokio::test]
async fn test_run_uses_default_incremental() {
    let h = harness(DAILY, None, OperationRegistry::with_builtins()).await;
    let state = h.crawler.run(None).await.unwrap();
    assert_eq!(state.incremental, Some(true));
}

#[tokio::test]
async fn test_replay_dispatches_one_task_per_result() {
    let h = harness(DAILY, None, OperationRegistry::with_builtins()).await;
    let results = &h.runtime.stores.results;
    let run_id = Uuid::new_v4();
    for url in ["a", "b"] {
        results
            .create(&StageResult::new("news", "init", "clean", run_id, json!({ "url": url })))
            .await
            .unwrap();
    }
    results
        .create(&StageResult::new("news", "clean", "store", run_id, json!({ "url": "a" })))
        .await
        .unwrap();
    results
        .create(&StageResult::new("other", "init", "clean", run_id, json!({ "url": "z" })))
        .await
        .unwrap();

    assert_eq!(h.crawler.replay("clean").await.unwrap(), 2);
    assert_eq!(h.queue.pending("news").await.unwrap(), 2);

    let first = h.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    let second = h.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(first.stage, "clean");
    assert_eq!(second.stage, "clean");
    assert_eq!(first.state.incremental, None);
    assert_ne!(first.state.run_id, run_id);
    assert_eq!(first.state.run_id, second.state.run_id);

    assert_eq!(h.crawler.replay("init").await.unwrap(), 0);
    assert!(matches!(
        h.crawler.replay("missing").await,
        Err(CrawlerError::UnknownStage { .. })
    ));
}

#[tokio::test]
async fn test_flush_notifies_and_keeps_counters() {
    let store = Arc::new(InMemoryRunStateRepository::new());
    let h = harness(DAILY, Some(store.clone()), OperationRegistry::with_builtins()).await;
    store.begin_op("news", Duration::from_secs(60)).await.unwrap();
    store.finish_op("news", Duration::from_secs(60)).await.unwrap();
    h.runtime
        .stores
        .results
        .create(&StageResult::new("news", "init", "clean", Uuid::new_v4(), json!({})))
        .await
        .unwrap();

    let flushed = Arc::new(Mutex::new(Vec::new()));
    {
        let flushed = flushed.clone();
        h.runtime
            .notifications
            .subscribe(move |notification: &CrawlerNotification| {
                let CrawlerNotification::Flushed { crawler } = notification;
                flushed.lock().push(crawler.name.clone());
            });
    }

    let summary = h.crawler.flush().await.unwrap();
    assert_eq!(summary.results, 1);
    assert_eq!(*flushed.lock(), vec!["news".to_string()]);
    assert_eq!(h.crawler.get_op_count().await, Some(1));
    assert_eq!(h.crawler.replay("clean").await.unwrap(), 0);
}

#[tokio::test]
async fn test_reset_run_state_refuses_while_running() {
    let store = Arc::new(InMemoryRunStateRepository::new());
    let h = harness(DAILY, Some(store.clone()), OperationRegistry::with_builtins()).await;
    store.set_active_ops("news", 1);

    assert!(matches!(
        h.crawler.reset_run_state().await,
        Err(CrawlerError::Running(_))
    ));

    store.set_active_ops("news", 0);
    assert!(h.crawler.reset_run_state().await.unwrap());
    assert_eq!(store.active_ops("news").await.unwrap(), None);
}

fn counting_registry(calls: Arc<AtomicUsize>) -> OperationRegistry {
    let mut registry = OperationRegistry::with_builtins();
    registry.register_cleanup_fn("news:cleanup", move |_crawler| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    registry
}

#[tokio::test]
async fn test_cleanup_runs_once_after_idle() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(InMemoryRunStateRepository::new());
    let h = harness(DAILY, Some(store.clone()), counting_registry(calls.clone())).await;

    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::NotRun);

    h.crawler.run(None).await.unwrap();
    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::Running);

    let task = h.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    h.queue.complete(&task).await.unwrap();
    store.set_active_ops("news", 1);
    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::Running);

    store.set_active_ops("news", 0);
    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::Completed);
    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::NotRun);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cleanup_refuses_when_indeterminate() {
    let calls = Arc::new(AtomicUsize::new(0));
    let h = harness(
        DAILY,
        Some(Arc::new(failing_store_allowing_run())),
        counting_registry(calls.clone()),
    )
    .await;

    h.crawler.run(None).await.unwrap();
    let task = h.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    h.queue.complete(&task).await.unwrap();

    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::Indeterminate);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

fn failing_store_allowing_run() -> MockRunState {
    let mut store = failing_store();
    store.expect_set_last_run().returning(|_, _, _| Ok(()));
    store
}

#[tokio::test]
async fn test_cleanup_not_configured_and_unresolved() {
    let plain = DAILY.replace("cleanup_method: \"news:cleanup\"\n", "");
    let h = harness(&plain, None, OperationRegistry::with_builtins()).await;
    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::NotConfigured);

    // 清理回调在首次使用时才解析
    let h = harness(DAILY, None, OperationRegistry::with_builtins()).await;
    h.crawler.run(None).await.unwrap();
    let task = h.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    h.queue.complete(&task).await.unwrap();
    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::Unresolved);
    assert_eq!(h.crawler.cleanup().await, CleanupOutcome::NotRun);
}

#[tokio::test]
async fn test_status_snapshot() {
    let store = Arc::new(InMemoryRunStateRepository::new());
    let h = harness(DAILY, Some(store), OperationRegistry::with_builtins()).await;

    let status = h.crawler.status().await;
    assert_eq!(status.name, "news");
    assert_eq!(status.schedule, Schedule::Daily);
    assert_eq!(status.op_count, Some(0));
    assert!(status.due);
    assert!(!status.is_running);
}
