// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use migration::{Migrator, MigratorTrait};
use pipecrawl::domain::models::crawler::{CrawlerDefinition, DefinitionDefaults};
use pipecrawl::domain::services::crawler_manager::CrawlerManager;
use pipecrawl::domain::services::runtime::{CrawlerRuntime, RuntimeOptions};
use pipecrawl::infrastructure::cache::memory_run_state::InMemoryRunStateRepository;
use pipecrawl::infrastructure::repositories::database_stores;
use pipecrawl::operations::OperationRegistry;
use pipecrawl::queue::memory_queue::InMemoryTaskQueue;
use pipecrawl::workers::manager::WorkerManager;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;

/// 进程内的完整运行环境：SQLite 内存库、内存队列和内存运行状态
#[allow(dead_code)]
pub struct TestPipeline {
    pub db: Arc<DatabaseConnection>,
    pub queue: Arc<InMemoryTaskQueue>,
    pub run_state: Arc<InMemoryRunStateRepository>,
    pub runtime: Arc<CrawlerRuntime>,
    pub manager: Arc<CrawlerManager>,
}

pub async fn create_pipeline(
    sources: &[&str],
    registry: OperationRegistry,
    options: RuntimeOptions,
) -> TestPipeline {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let db = Arc::new(db);

    let definitions: Vec<CrawlerDefinition> = sources
        .iter()
        .map(|source| {
            CrawlerDefinition::from_yaml(source, "test", &DefinitionDefaults::default(), &registry)
                .unwrap()
        })
        .collect();

    let queue = Arc::new(InMemoryTaskQueue::new());
    let run_state = Arc::new(InMemoryRunStateRepository::new());
    let runtime = Arc::new(CrawlerRuntime::new(
        queue.clone(),
        Some(run_state.clone()),
        database_stores(db.clone()),
        Arc::new(registry),
        options,
    ));

    let mut manager = CrawlerManager::new(runtime.clone());
    for definition in definitions {
        assert!(manager.register(definition));
    }

    TestPipeline {
        db,
        queue,
        run_state,
        runtime,
        manager: Arc::new(manager),
    }
}

/// 同步模式：`run()` 在队列清空后才返回
pub fn eager_options() -> RuntimeOptions {
    RuntimeOptions {
        eager: true,
        eager_timeout: Duration::from_secs(10),
        ..RuntimeOptions::default()
    }
}

#[allow(dead_code)]
pub async fn start_workers(pipeline: &TestPipeline, count: usize) -> WorkerManager {
    let mut workers = WorkerManager::new(pipeline.manager.clone(), Duration::from_millis(5));
    workers.start_workers(count).await;
    workers
}
