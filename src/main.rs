// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use pipecrawl::config::settings::Settings;
use pipecrawl::domain::models::crawler::DefinitionDefaults;
use pipecrawl::domain::repositories::run_state_repository::RunStateRepository;
use pipecrawl::domain::services::crawler_manager::CrawlerManager;
use pipecrawl::domain::services::runtime::{CrawlerRuntime, RuntimeOptions};
use pipecrawl::infrastructure::cache::redis_client::RedisClient;
use pipecrawl::infrastructure::cache::redis_run_state::RedisRunStateRepository;
use pipecrawl::infrastructure::database::connection;
use pipecrawl::infrastructure::metrics;
use pipecrawl::infrastructure::repositories::database_stores;
use pipecrawl::operations::OperationRegistry;
use pipecrawl::presentation::routes;
use pipecrawl::queue::memory_queue::InMemoryTaskQueue;
use pipecrawl::queue::redis_queue::RedisTaskQueue;
use pipecrawl::queue::scheduler::CrawlerScheduler;
use pipecrawl::queue::task_queue::TaskQueue;
use pipecrawl::utils::telemetry;
use pipecrawl::workers::manager::WorkerManager;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use migration::{Migrator, MigratorTrait};

async fn connect_redis(url: &str) -> anyhow::Result<RedisClient> {
    let client = RedisClient::new(url).await?;
    client.ping().await?;
    Ok(client)
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    if let Err(e) = telemetry::init_telemetry() {
        eprintln!("Failed to initialize logging: {}", e);
    }
    info!("Starting pipecrawl...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Run-state store and queue
    let (queue, run_state): (Arc<dyn TaskQueue>, Option<Arc<dyn RunStateRepository>>) =
        match settings.redis.url.as_deref() {
            Some(url) => match connect_redis(url).await {
                Ok(client) => {
                    info!("Redis client initialized");
                    let queue = RedisTaskQueue::new(client.clone());
                    queue.recover_in_flight().await?;
                    (
                        Arc::new(queue),
                        Some(Arc::new(RedisRunStateRepository::new(client))),
                    )
                }
                Err(e) => {
                    warn!(
                        "Redis unavailable ({}), falling back to in-process queue without run state",
                        e
                    );
                    (Arc::new(InMemoryTaskQueue::new()), None)
                }
            },
            None => {
                warn!("No redis url configured, scheduling and monitoring are degraded");
                (Arc::new(InMemoryTaskQueue::new()), None)
            }
        };

    // 5. Load crawler definitions
    let registry = Arc::new(OperationRegistry::with_builtins());
    let runtime = Arc::new(CrawlerRuntime::new(
        queue,
        run_state,
        database_stores(db.clone()),
        registry,
        RuntimeOptions::from(&settings.crawlers),
    ));
    let defaults = DefinitionDefaults {
        expire: Duration::from_secs(settings.crawlers.expire),
    };
    let manager = Arc::new(CrawlerManager::load_directory(
        Path::new(&settings.crawlers.config_path),
        &defaults,
        runtime,
    ));
    info!("Loaded {} crawler(s)", manager.len());

    // 6. Start workers and scheduler
    let mut worker_manager = WorkerManager::new(manager.clone(), settings.workers.poll_interval());
    worker_manager.start_workers(settings.workers.count).await;

    let scheduler = if settings.scheduler.enabled {
        Some(CrawlerScheduler::new(manager.clone(), settings.scheduler.tick()).start())
    } else {
        info!("Scheduler disabled");
        None
    };

    // 7. Start HTTP server
    let app = routes::app(manager);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    worker_manager.wait_for_shutdown().await;
    if let Some(scheduler) = scheduler {
        scheduler.abort();
    }
    server.abort();

    Ok(())
}
