// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{create_pipeline, start_workers};
use migration::{Migrator, MigratorTrait};
use pipecrawl::domain::models::crawler::DefinitionDefaults;
use pipecrawl::domain::repositories::run_state_repository::RunStateRepository;
use pipecrawl::domain::services::crawler_manager::CrawlerManager;
use pipecrawl::domain::services::runtime::{CrawlerRuntime, RuntimeOptions};
use pipecrawl::infrastructure::repositories::database_stores;
use pipecrawl::operations::OperationRegistry;
use pipecrawl::queue::memory_queue::InMemoryTaskQueue;
use pipecrawl::queue::scheduler::CrawlerScheduler;
use pipecrawl::queue::task_queue::TaskQueue;
use sea_orm::Database;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

async fn runtime() -> Arc<CrawlerRuntime> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(CrawlerRuntime::new(
        Arc::new(InMemoryTaskQueue::new()),
        None,
        database_stores(Arc::new(db)),
        Arc::new(OperationRegistry::with_builtins()),
        RuntimeOptions::default(),
    ))
}

#[tokio::test]
async fn test_load_directory_skips_broken_definitions() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a_news.yml"),
        "name: news\ndescription: first\npipeline:\n  init:\n    method: inspect\n",
    )
    .unwrap();
    fs::write(dir.path().join("b_broken.yaml"), "pipeline: [not, a, map]\n").unwrap();
    fs::write(
        dir.path().join("c_duplicate.yml"),
        "name: news\ndescription: second\npipeline:\n  init:\n    method: inspect\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("d_unknown_op.yml"),
        "pipeline:\n  init:\n    method: does_not_exist\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("weather.yaml"),
        "schedule: weekly\npipeline:\n  init:\n    method: inspect\n",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not a crawler").unwrap();

    let manager =
        CrawlerManager::load_directory(dir.path(), &DefinitionDefaults::default(), runtime().await);

    let names: Vec<&str> = manager.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["news", "weather"]);
    assert_eq!(manager.get("news").unwrap().definition().description, "first");
    assert!(manager.get("d_unknown_op").is_none());
}

#[tokio::test]
async fn test_load_missing_directory_is_empty() {
    let dir = tempdir().unwrap();
    let manager = CrawlerManager::load_directory(
        &dir.path().join("absent"),
        &DefinitionDefaults::default(),
        runtime().await,
    );
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_scheduler_runs_due_crawlers_once() {
    let daily = "name: daily\nschedule: daily\ncleanup_method: \"daily:cleanup\"\npipeline:\n  init:\n    method: inspect\n";
    let manual = "name: manual\npipeline:\n  init:\n    method: inspect\n";
    let mut registry = OperationRegistry::with_builtins();
    registry.register_cleanup_fn("daily:cleanup", |_definition| async { Ok(()) });
    let pipeline =
        create_pipeline(&[daily, manual], registry, RuntimeOptions::default()).await;

    let mut scheduler = CrawlerScheduler::new(pipeline.manager.clone(), Duration::from_secs(60));
    assert_eq!(scheduler.tick().await, 1);
    assert!(pipeline.run_state.last_run("daily").await.unwrap().is_some());
    assert!(pipeline.run_state.last_run("manual").await.unwrap().is_none());

    // 任务尚未执行，清理等待中
    assert_eq!(pipeline.queue.pending("daily").await.unwrap(), 1);
    assert_eq!(scheduler.awaiting_cleanup(), 1);

    assert_eq!(scheduler.tick().await, 0);

    let mut workers = start_workers(&pipeline, 1).await;
    pipeline
        .queue
        .wait_idle("daily", Duration::from_secs(10))
        .await
        .unwrap();
    workers.shutdown();

    assert_eq!(scheduler.tick().await, 0);
    assert_eq!(scheduler.awaiting_cleanup(), 0);
}
